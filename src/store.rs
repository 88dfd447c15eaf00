use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::warn;

/// Failure of a single persistence target. Callers decide whether to fall back.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("remote store not connected")]
    NotConnected,

    #[error("remote store timed out after {0:?}")]
    Timeout(Duration),

    #[error("not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("local storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("local storage encoding error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0} out of range")]
    OutOfRange(&'static str),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Remote target used when `REMOTE_ENABLED=false`; every call fails with `NotConnected`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Disconnected;

/// Runs a remote call under the client-side timeout; elapsing counts as a failure.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}

/// Directory of JSON documents, one per key. Stands in for browser local storage.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn ensure_dir(&self) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("create local store dir {}", self.dir.display()))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Missing or unparseable documents read as `T::default()`. Read-only paths
    /// only; any other I/O failure is logged and also reads as empty.
    pub async fn load<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        match self.try_load(key).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, key, "local read failed; treating as empty");
                T::default()
            }
        }
    }

    /// Like `load`, but I/O failures other than a missing file are returned.
    /// Read-modify-write paths use this so an unreadable file is never overwritten.
    pub async fn try_load<T>(&self, key: &str) -> StoreResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path_for(key);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&raw) {
            Ok(v) => Ok(v),
            Err(e) => {
                warn!(error = %e, path = %path.display(), "malformed local data; treating as empty");
                Ok(T::default())
            }
        }
    }

    pub async fn save<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let body = serde_json::to_vec_pretty(value)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}
