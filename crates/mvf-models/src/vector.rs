//! Aggregated vector models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Level at which a vector was pooled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AggregationScope {
    /// Pooled over the frames of one shot
    Shot,
    /// Pooled over a whole movie
    Movie,
}

/// One fixed-dimension vector produced by pooling.
///
/// Dimension is constant across all vectors produced by a given
/// (model, pooling strategy) configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AggregatedVector {
    /// Movie the vector describes
    pub movie_id: u32,

    /// Pooling level that produced the vector
    pub scope: AggregationScope,

    /// The pooled vector
    pub vector: Vec<f32>,
}

impl AggregatedVector {
    /// Dimension of the pooled vector.
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}
