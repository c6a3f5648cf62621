//! Fusion error types.

use thiserror::Error;

/// Result type for fusion operations.
pub type FusionResult<T> = Result<T, FusionError>;

/// Errors that can occur during entity resolution and fusion.
#[derive(Debug, Error)]
pub enum FusionError {
    /// An input vector does not match its configured expected
    /// dimension. Structural: signals a model/configuration mismatch
    /// upstream, so no retry is appropriate.
    #[error("Dimension mismatch for movie {movie_id} ({modality}): expected {expected}, got {got}")]
    DimensionMismatch {
        movie_id: u32,
        modality: &'static str,
        expected: usize,
        got: usize,
    },

    /// Weighted-sum fusion requires both modalities to share one
    /// dimension; caught when the fuser is configured, not per movie.
    #[error("Weighted-sum fusion requires equal dimensions, got textual {textual_dim} and visual {visual_dim}")]
    WeightedSumDimensions {
        textual_dim: usize,
        visual_dim: usize,
    },

    #[error("Fused dimension must be positive")]
    EmptyDimensions,
}
