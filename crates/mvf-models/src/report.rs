//! Overlap report and fused vector models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Movies present in both datasets of one pair.
///
/// Keyed by an unordered dataset-name pair; `first`/`second` are stored
/// in lexicographic order so the entry is independent of input order.
/// Downstream fusion reads these for movies with partial modality
/// coverage.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PairwiseOverlap {
    /// Lexicographically smaller dataset name
    pub first: String,

    /// Lexicographically larger dataset name
    pub second: String,

    /// Movie ids present in both datasets
    pub ids: BTreeSet<u32>,
}

impl PairwiseOverlap {
    /// Whether this entry covers the given (unordered) dataset pair.
    pub fn is_between(&self, a: &str, b: &str) -> bool {
        (self.first == a && self.second == b) || (self.first == b && self.second == a)
    }
}

/// Result of resolving movie identities across datasets.
///
/// Symmetric in dataset order: the same three datasets produce the same
/// report regardless of how they were passed in.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OverlapReport {
    /// Names of the resolved datasets, as passed in
    pub dataset_names: Vec<String>,

    /// Movie ids present in every dataset
    pub matched_ids: BTreeSet<u32>,

    /// Movies present in both datasets of each pair
    pub pairwise: Vec<PairwiseOverlap>,

    /// Standalone size of each dataset
    pub per_dataset_counts: BTreeMap<String, usize>,

    /// Size of the full intersection
    pub matched_count: usize,

    /// When the report was produced
    pub generated_at: DateTime<Utc>,
}

impl OverlapReport {
    /// Look up the pairwise overlap between two datasets, in either order.
    pub fn pair_between(&self, a: &str, b: &str) -> Option<&PairwiseOverlap> {
        self.pairwise.iter().find(|p| p.is_between(a, b))
    }
}

/// Which modalities genuinely contributed to a fused vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct ModalityMask {
    /// Textual vector was present
    pub textual: bool,
    /// Visual vector was present
    pub visual: bool,
}

impl ModalityMask {
    pub fn new(textual: bool, visual: bool) -> Self {
        Self { textual, visual }
    }

    /// Both modalities contributed.
    pub fn is_complete(&self) -> bool {
        self.textual && self.visual
    }

    /// Neither modality contributed.
    pub fn is_empty(&self) -> bool {
        !self.textual && !self.visual
    }
}

/// A movie's combined textual + visual representation.
///
/// The fused dimension is fixed by configuration regardless of which
/// modalities were present; an absent modality was substituted per the
/// configured policy, never silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FusedVector {
    /// Movie the vector describes
    pub movie_id: u32,

    /// The fused vector
    pub fused: Vec<f32>,

    /// Which modalities genuinely contributed
    pub modalities: ModalityMask,
}

impl FusedVector {
    /// Dimension of the fused vector.
    pub fn dimension(&self) -> usize {
        self.fused.len()
    }
}
