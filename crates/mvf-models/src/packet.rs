//! Feature packet models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Source of a visual feature stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Features extracted from the full movie
    FullMovies,
    /// Features extracted from pre-cut movie shots
    MovieShots,
    /// Features extracted from the trailer
    MovieTrailers,
}

impl SourceType {
    /// All supported sources.
    pub const ALL: &'static [SourceType] = &[
        SourceType::FullMovies,
        SourceType::MovieShots,
        SourceType::MovieTrailers,
    ];

    /// Returns the source name as used in packet addresses.
    pub fn as_path_part(&self) -> &'static str {
        match self {
            SourceType::FullMovies => "full_movies",
            SourceType::MovieShots => "movie_shots",
            SourceType::MovieTrailers => "movie_trailers",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_path_part())
    }
}

impl FromStr for SourceType {
    type Err = SourceTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full_movies" => Ok(SourceType::FullMovies),
            "movie_shots" => Ok(SourceType::MovieShots),
            "movie_trailers" => Ok(SourceType::MovieTrailers),
            _ => Err(SourceTypeParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown source type: {0}")]
pub struct SourceTypeParseError(String);

/// Embedding model that produced a feature stream.
///
/// Each model has a fixed output dimension; every frame vector in a
/// packet produced by that model must have exactly that dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeatureModel {
    /// InceptionV3 penultimate-layer features
    Incp3,
    /// VGG19 penultimate-layer features
    Vgg19,
}

impl FeatureModel {
    /// All supported models.
    pub const ALL: &'static [FeatureModel] = &[FeatureModel::Incp3, FeatureModel::Vgg19];

    /// Returns the model name as used in packet addresses.
    pub fn as_path_part(&self) -> &'static str {
        match self {
            FeatureModel::Incp3 => "incp3",
            FeatureModel::Vgg19 => "vgg19",
        }
    }

    /// Output dimension of the model's frame vectors.
    pub fn dimension(&self) -> usize {
        match self {
            FeatureModel::Incp3 => 2048,
            FeatureModel::Vgg19 => 4096,
        }
    }
}

impl fmt::Display for FeatureModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_path_part())
    }
}

impl FromStr for FeatureModel {
    type Err = FeatureModelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "incp3" => Ok(FeatureModel::Incp3),
            "vgg19" => Ok(FeatureModel::Vgg19),
            _ => Err(FeatureModelParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown feature model: {0}")]
pub struct FeatureModelParseError(String);

/// One addressable chunk of a movie's frame-level feature stream.
///
/// Packets are fetched in `sequence_index` order; indices are 0-based,
/// strictly increasing, and gap-free within a (movie, source, model)
/// stream. A gap means the fetch failed, never that frames are missing.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FeaturePacket {
    /// Movie this packet belongs to
    pub movie_id: u32,

    /// Source of the feature stream
    pub source: SourceType,

    /// Model that produced the vectors
    pub model: FeatureModel,

    /// 0-based position of this packet within the stream
    pub sequence_index: u32,

    /// Ordered block of frame vectors carried by this packet
    pub vectors: Vec<Vec<f32>>,
}

impl FeaturePacket {
    /// Number of frame vectors in this packet.
    pub fn frame_count(&self) -> usize {
        self.vectors.len()
    }

    /// Whether every vector matches the model's fixed dimension.
    pub fn dimensions_match_model(&self) -> bool {
        let expected = self.model.dimension();
        self.vectors.iter().all(|v| v.len() == expected)
    }
}
