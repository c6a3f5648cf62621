//! Shared data models for the MovieFeats pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Feature packets and their source/model enumerations
//! - Shots and aggregated vectors
//! - Movie metadata records
//! - Overlap reports and fused multimodal vectors
//! - Validated pipeline configuration enumerations

pub mod config;
pub mod movie;
pub mod packet;
pub mod report;
pub mod shot;
pub mod vector;

// Re-export common types
pub use config::{DistanceMetric, FusionPolicy, MissingModalityPolicy, PoolingStrategy};
pub use movie::MovieRecord;
pub use packet::{FeatureModel, FeaturePacket, SourceType};
pub use report::{FusedVector, ModalityMask, OverlapReport, PairwiseOverlap};
pub use shot::Shot;
pub use vector::{AggregatedVector, AggregationScope};
