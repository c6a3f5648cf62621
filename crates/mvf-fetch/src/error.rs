//! Fetch error types.

use mvf_models::{FeatureModel, SourceType};
use thiserror::Error;

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors that can occur while fetching feature packets.
///
/// Every variant that concerns a specific packet carries the movie id,
/// source, model, and sequence index of the failed fetch so the caller
/// can retry, skip the movie, or abort without re-running with added
/// instrumentation.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Movie id must be a positive integer, got {0}")]
    InvalidMovieId(u32),

    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("Network error fetching packet {index} of movie {movie_id} ({source_type}/{model}): {reason}")]
    Network {
        movie_id: u32,
        source_type: SourceType,
        model: FeatureModel,
        index: u32,
        reason: String,
    },

    #[error("Packet store returned {status} for packet {index} of movie {movie_id} ({source_type}/{model})")]
    RequestFailed {
        movie_id: u32,
        source_type: SourceType,
        model: FeatureModel,
        index: u32,
        status: u16,
    },

    #[error("Malformed packet {index} of movie {movie_id} ({source_type}/{model}): {reason}")]
    MalformedPacket {
        movie_id: u32,
        source_type: SourceType,
        model: FeatureModel,
        index: u32,
        reason: String,
    },

    #[error("Sequence gap in movie {movie_id} ({source_type}/{model}): expected packet {expected}, store returned {got}")]
    SequenceGap {
        movie_id: u32,
        source_type: SourceType,
        model: FeatureModel,
        expected: u32,
        got: u32,
    },
}

impl FetchError {
    /// Whether a retry of the same request could succeed.
    ///
    /// Malformed packets and sequence gaps are structural: the stored
    /// data is wrong, so retrying fetches the same bad bytes.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network { .. } => true,
            FetchError::RequestFailed { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Sequence index of the failed fetch, if the error concerns one.
    pub fn failed_index(&self) -> Option<u32> {
        match self {
            FetchError::Network { index, .. }
            | FetchError::RequestFailed { index, .. }
            | FetchError::MalformedPacket { index, .. } => Some(*index),
            FetchError::SequenceGap { expected, .. } => Some(*expected),
            FetchError::InvalidMovieId(_) | FetchError::Client(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_failed(status: u16) -> FetchError {
        FetchError::RequestFailed {
            movie_id: 6,
            source_type: SourceType::MovieTrailers,
            model: FeatureModel::Incp3,
            index: 3,
            status,
        }
    }

    #[test]
    fn test_server_errors_are_retryable() {
        assert!(request_failed(500).is_retryable());
        assert!(request_failed(429).is_retryable());
        assert!(!request_failed(403).is_retryable());
    }

    #[test]
    fn test_structural_errors_not_retryable() {
        let gap = FetchError::SequenceGap {
            movie_id: 6,
            source_type: SourceType::FullMovies,
            model: FeatureModel::Vgg19,
            expected: 2,
            got: 4,
        };
        assert!(!gap.is_retryable());
        assert_eq!(gap.failed_index(), Some(2));
    }
}
