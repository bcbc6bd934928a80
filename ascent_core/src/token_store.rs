//! Bearer token persistence.
//!
//! The token is the only piece of state shared across requests. Stores are
//! injected into the [`ApiClient`](crate::client::ApiClient) rather than read
//! from a global, so tests can use [`MemoryTokenStore`].

use crate::{Error, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// Somewhere to keep the current bearer token
pub trait TokenStore: Send + Sync {
    /// Current token, `None` when logged out
    fn get(&self) -> Result<Option<String>>;

    /// Replace the stored token
    fn set(&self, token: &str) -> Result<()>;

    /// Forget the token. Clearing an empty store is not an error.
    fn clear(&self) -> Result<()>;

    fn is_present(&self) -> bool {
        matches!(self.get(), Ok(Some(_)))
    }
}

/// Token kept only for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<String>> {
        let guard = self
            .token
            .lock()
            .map_err(|_| Error::TokenStore("token lock poisoned".into()))?;
        Ok(guard.clone())
    }

    fn set(&self, token: &str) -> Result<()> {
        let mut guard = self
            .token
            .lock()
            .map_err(|_| Error::TokenStore("token lock poisoned".into()))?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .token
            .lock()
            .map_err(|_| Error::TokenStore("token lock poisoned".into()))?;
        *guard = None;
        Ok(())
    }
}

/// Token persisted to a single file so it survives between runs
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    /// Read the token with a shared lock
    ///
    /// A missing, unreadable or empty file means "no token".
    fn get(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open token file {:?}: {}. Treating as logged out.",
                    self.path,
                    e
                );
                return Ok(None);
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock token file {:?}: {}. Treating as logged out.",
                self.path,
                e
            );
            return Ok(None);
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read token file {:?}: {}", self.path, e);
            return Ok(None);
        }

        file.unlock()?;

        let token = contents.trim();
        if token.is_empty() {
            Ok(None)
        } else {
            Ok(Some(token.to_string()))
        }
    }

    /// Atomically replace the token file (temp file, fsync, rename)
    fn set(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(self.path.parent().ok_or_else(|| {
            Error::TokenStore("token path missing parent".into())
        })?)?;

        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            writer.write_all(token.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved token to {:?}", self.path);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!("Removed token file {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }
}
