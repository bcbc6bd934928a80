#![forbid(unsafe_code)]

//! Client library for the Ascent climbing-training tracker.
//!
//! This crate provides:
//! - Domain types (sessions, grades, exercises, programs, goals, stats)
//! - Token storage (file-backed and in-memory)
//! - The authenticated HTTP client and one call per backend operation
//! - Login/registration flows, dashboard loading, session filtering and export

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod token_store;
pub mod client;
pub mod api;
pub mod auth;
pub mod dashboard;
pub mod history;
pub mod export;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use client::{ApiClient, ApiRequest, ApiResponse, ClientConfig, Transport};
pub use auth::{AuthSession, RegisterForm};
pub use dashboard::{load_dashboard, Dashboard, Period};
pub use history::SessionFilter;
pub use export::export_sessions_csv;
