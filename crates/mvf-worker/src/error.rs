//! Worker error types.

use thiserror::Error;

/// Result type for worker operations.
pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors that can occur while orchestrating a run.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Run aborted: movie {movie_id} failed: {reason}")]
    Aborted { movie_id: u32, reason: String },

    #[error(transparent)]
    Fetch(#[from] mvf_fetch::FetchError),

    #[error(transparent)]
    Pipeline(#[from] mvf_pipeline::PipelineError),

    #[error(transparent)]
    Dataset(#[from] mvf_datasets::DatasetError),

    #[error(transparent)]
    Fusion(#[from] mvf_fusion::FusionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
