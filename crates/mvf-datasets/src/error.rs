//! Dataset error types.

use thiserror::Error;

/// Result type for dataset operations.
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Errors that can occur while loading or querying datasets.
///
/// A query that merely finds nothing is not an error: lookups return
/// `Option`/empty collections. These variants are load-time failures
/// that must abort the affected dataset rather than proceed on
/// partial data.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Schema error in dataset '{dataset}': {reason}")]
    Schema { dataset: String, reason: String },

    #[error("Duplicate movie id {movie_id} in dataset '{dataset}'")]
    DuplicateKey { dataset: String, movie_id: u32 },

    #[error("Failed to fetch '{url}': {reason}")]
    Http { url: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
}

impl DatasetError {
    /// Create a schema error.
    pub fn schema(dataset: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Schema {
            dataset: dataset.into(),
            reason: reason.into(),
        }
    }
}
