//! Remote feature packet store client.
//!
//! This crate provides:
//! - Deterministic packet address construction
//! - A restartable, in-order packet stream per movie
//! - Bounded-concurrency fetching across movies
//! - Fault reporting that distinguishes normal stream exhaustion from
//!   fetch failures

pub mod address;
pub mod client;
pub mod error;
pub mod stream;

pub use address::packet_address;
pub use client::{FetcherConfig, PacketFetcher};
pub use error::{FetchError, FetchResult};
pub use stream::PacketStream;
