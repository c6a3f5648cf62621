//! Cross-dataset entity resolution and multimodal fusion.
//!
//! This crate provides:
//! - The overlap checker: a three-relation hash-join over normalized
//!   movie ids, producing three-way and pairwise intersections
//! - The fuser: combines a movie's textual and visual vectors under a
//!   configured fusion policy, tolerant of missing modalities

pub mod error;
pub mod fuse;
pub mod overlap;

pub use error::{FusionError, FusionResult};
pub use fuse::Fuser;
pub use overlap::{resolve, Dataset};
