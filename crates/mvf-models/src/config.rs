//! Validated pipeline configuration enumerations.
//!
//! Every knob that selects a behavior is a closed enum parsed with
//! `FromStr`. An unrecognized value is a parse error, never a silent
//! fallback to a default branch.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Pooling strategy for reducing a vector sequence into one vector.
///
/// All strategies are commutative and associative element-wise
/// reductions, so partial aggregates over disjoint chunks can be
/// merged in any order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PoolingStrategy {
    /// Element-wise arithmetic mean
    Mean,
    /// Element-wise maximum
    Max,
    /// Element-wise sum
    Sum,
}

impl PoolingStrategy {
    /// All supported strategies.
    pub const ALL: &'static [PoolingStrategy] =
        &[PoolingStrategy::Mean, PoolingStrategy::Max, PoolingStrategy::Sum];

    pub fn as_str(&self) -> &'static str {
        match self {
            PoolingStrategy::Mean => "mean",
            PoolingStrategy::Max => "max",
            PoolingStrategy::Sum => "sum",
        }
    }
}

impl fmt::Display for PoolingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PoolingStrategy {
    type Err = PoolingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mean" => Ok(PoolingStrategy::Mean),
            "max" => Ok(PoolingStrategy::Max),
            "sum" => Ok(PoolingStrategy::Sum),
            _ => Err(PoolingParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown pooling strategy: {0}")]
pub struct PoolingParseError(String);

/// Rule for combining two present modalities into one fused vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FusionPolicy {
    /// Concatenate textual then visual
    Concat,
    /// Element-wise weighted sum; requires equal dimensions
    WeightedSum,
}

impl FusionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FusionPolicy::Concat => "concat",
            FusionPolicy::WeightedSum => "weighted_sum",
        }
    }
}

impl fmt::Display for FusionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FusionPolicy {
    type Err = FusionPolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "concat" => Ok(FusionPolicy::Concat),
            "weighted_sum" | "weighted-sum" => Ok(FusionPolicy::WeightedSum),
            _ => Err(FusionPolicyParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown fusion policy: {0}")]
pub struct FusionPolicyParseError(String);

/// What to do when exactly one modality is present for a movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MissingModalityPolicy {
    /// Substitute a zero vector of the expected dimension
    ZeroFill,
    /// Drop the movie from the fused output entirely
    Exclude,
}

impl MissingModalityPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingModalityPolicy::ZeroFill => "zero_fill",
            MissingModalityPolicy::Exclude => "exclude",
        }
    }
}

impl fmt::Display for MissingModalityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MissingModalityPolicy {
    type Err = MissingModalityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zero_fill" | "zero-fill" => Ok(MissingModalityPolicy::ZeroFill),
            "exclude" => Ok(MissingModalityPolicy::Exclude),
            _ => Err(MissingModalityParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown missing-modality policy: {0}")]
pub struct MissingModalityParseError(String);

/// Distance metric for shot boundary detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// One minus cosine similarity (default)
    Cosine,
    /// Euclidean (L2) distance
    Euclidean,
}

impl DistanceMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = DistanceMetricParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "euclidean" => Ok(DistanceMetric::Euclidean),
            _ => Err(DistanceMetricParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown distance metric: {0}")]
pub struct DistanceMetricParseError(String);
