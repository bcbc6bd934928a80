//! In-process transport for unit tests.

use crate::client::{ApiRequest, ApiResponse, Method, Transport};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;

/// Records every request and answers from a canned route table.
/// Unknown routes get a 404.
#[derive(Default)]
pub struct MockTransport {
    routes: HashMap<(Method, String), ApiResponse>,
    requests: Mutex<Vec<ApiRequest>>,
    barrier: Option<Arc<Barrier>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, method: Method, path: &str, status: u16, body: &str) -> Self {
        self.routes
            .insert((method, path.to_string()), ApiResponse::new(status, body));
        self
    }

    /// Hold every response until `n` requests are in flight at once
    pub fn rendezvous(mut self, n: usize) -> Self {
        self.barrier = Some(Arc::new(Barrier::new(n)));
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let key = (request.method.clone(), request.path.clone());
        self.requests.lock().unwrap().push(request);

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }

        Ok(self
            .routes
            .get(&key)
            .cloned()
            .unwrap_or_else(|| ApiResponse::new(404, r#"{"detail": "Not Found"}"#)))
    }
}
