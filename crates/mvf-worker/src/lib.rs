//! Pipeline orchestrator worker.
//!
//! Pure dispatch over the validated run mode: selects which pipeline
//! stages to run, drives movies through them with bounded parallelism
//! and per-movie fault isolation, and writes the produced artifacts.

pub mod config;
pub mod error;
pub mod executor;

pub use config::{DatasetTask, FaultPolicy, PipelineTask, RecsysTask, RunMode, WorkerConfig};
pub use error::{WorkerError, WorkerResult};
pub use executor::RunExecutor;
