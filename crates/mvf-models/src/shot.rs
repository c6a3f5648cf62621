//! Shot models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A contiguous run of frames judged visually continuous.
///
/// Shots for a movie form a contiguous, non-overlapping partition of
/// `[0, frame_count - 1]`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Shot {
    /// Movie this shot belongs to
    pub movie_id: u32,

    /// 0-based index of the first frame in the shot
    pub start_index: usize,

    /// 0-based index of the last frame in the shot (inclusive)
    pub end_index: usize,

    /// Pooled representative vector for the shot
    pub representative: Vec<f32>,
}

impl Shot {
    /// Number of frames in the shot.
    pub fn frame_count(&self) -> usize {
        self.end_index - self.start_index + 1
    }

    /// Whether the given frame index falls inside this shot.
    pub fn contains(&self, frame_index: usize) -> bool {
        frame_index >= self.start_index && frame_index <= self.end_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count_inclusive() {
        let shot = Shot {
            movie_id: 1,
            start_index: 5,
            end_index: 9,
            representative: vec![],
        };
        assert_eq!(shot.frame_count(), 5);
        assert!(shot.contains(5));
        assert!(shot.contains(9));
        assert!(!shot.contains(10));
    }
}
