//! Pipeline error types.

use mvf_fetch::FetchError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that can occur during segmentation and aggregation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Vectors of incompatible dimension reached a reduction. This is
    /// structural (a model/configuration mismatch upstream): it must
    /// propagate, never be padded or truncated away.
    #[error("Dimension mismatch at position {position}: expected {expected}, got {got}")]
    DimensionMismatch {
        expected: usize,
        got: usize,
        position: usize,
    },

    #[error("Cannot aggregate an empty vector sequence")]
    EmptyInput,

    #[error("Partial aggregates are incompatible: {reason}")]
    IncompatiblePartials { reason: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl PipelineError {
    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, got: usize, position: usize) -> Self {
        Self::DimensionMismatch {
            expected,
            got,
            position,
        }
    }
}
