//! Application state management

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::pipeline::Pipeline;

use super::error::{Result, ServerError};
use super::ServerConfig;

/// Application state shared across handlers.
///
/// Every pipeline operation runs under the one mutex, so uploads,
/// preprocessing, splits and training never interleave.
pub struct AppState {
    pub config: ServerConfig,
    pub pipeline: Arc<Mutex<Pipeline>>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_pipeline(config, Pipeline::new())
    }

    pub fn with_pipeline(config: ServerConfig, pipeline: Pipeline) -> Self {
        Self {
            config,
            pipeline: Arc::new(Mutex::new(pipeline)),
            started_at: chrono::Utc::now(),
        }
    }

    /// Run a CPU-bound pipeline operation on the blocking pool.
    ///
    /// The lock is held by an owned guard for the whole call, so the
    /// async workers stay free while the operation still runs exclusively.
    pub async fn run_blocking<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Pipeline) -> crate::error::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut guard = Arc::clone(&self.pipeline).lock_owned().await;
        let joined = tokio::task::spawn_blocking(move || op(&mut *guard)).await;

        match joined {
            Ok(result) => Ok(result?),
            Err(e) => Err(ServerError::Internal(format!("pipeline task failed: {}", e))),
        }
    }

    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }
}
