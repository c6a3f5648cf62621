//! Shot segmentation and feature aggregation.
//!
//! This crate turns a movie's ordered frame-level feature stream into a
//! fixed-size per-movie vector:
//! - Distance metrics over frame vectors
//! - Shot boundary segmentation with minimum-length merging
//! - Commutative pooling (mean/max/sum) with chunkable partial
//!   aggregates
//! - The frame → shot → movie driver

pub mod aggregate;
pub mod distance;
pub mod error;
pub mod movie;
pub mod segmenter;

pub use aggregate::{aggregate, PartialAggregate};
pub use distance::distance;
pub use error::{PipelineError, PipelineResult};
pub use movie::{MovieFeatures, MoviePipeline};
pub use segmenter::ShotSegmenter;
