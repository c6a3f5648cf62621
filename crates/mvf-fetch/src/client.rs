//! Packet store HTTP client.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use reqwest::Client;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use mvf_models::{FeatureModel, FeaturePacket, SourceType};

use crate::address::packet_address;
use crate::error::{FetchError, FetchResult};
use crate::stream::PacketStream;

/// Configuration for the packet fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Base URL of the remote packet store
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Max retries for transient failures
    pub max_retries: u32,
    /// Max concurrent movie streams in [`PacketFetcher::fetch_movies`]
    pub max_parallel_movies: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://huggingface.co/datasets/alitourani/moviefeats_visual/raw/main"
                .to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
            max_parallel_movies: 4,
        }
    }
}

impl FetcherConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("MVF_PACKET_BASE_URL").unwrap_or(defaults.base_url),
            timeout: Duration::from_secs(
                std::env::var("MVF_FETCH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            max_retries: std::env::var("MVF_FETCH_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            max_parallel_movies: std::env::var("MVF_FETCH_MAX_PARALLEL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_parallel_movies),
        }
    }
}

/// Client for the remote feature packet store.
#[derive(Debug, Clone)]
pub struct PacketFetcher {
    http: Client,
    config: FetcherConfig,
}

impl PacketFetcher {
    /// Create a new fetcher.
    pub fn new(config: FetcherConfig) -> FetchResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> FetchResult<Self> {
        Self::new(FetcherConfig::from_env())
    }

    /// Base URL of the configured store.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Open a lazy, restartable packet stream for one movie.
    ///
    /// Each call starts a fresh cursor at packet 0; streams share no
    /// state, so re-calling restarts the fetch from scratch.
    pub fn stream(
        &self,
        source: SourceType,
        model: FeatureModel,
        movie_id: u32,
    ) -> FetchResult<PacketStream> {
        if movie_id == 0 {
            return Err(FetchError::InvalidMovieId(movie_id));
        }
        Ok(PacketStream::new(self.clone(), source, model, movie_id))
    }

    /// Fetch one packet by its sequence index.
    ///
    /// Returns `Ok(None)` when the store has no packet at that index
    /// (the stream's normal terminal state). Transient failures are
    /// retried with exponential backoff before surfacing an error.
    pub async fn fetch_packet(
        &self,
        source: SourceType,
        model: FeatureModel,
        movie_id: u32,
        index: u32,
    ) -> FetchResult<Option<FeaturePacket>> {
        if movie_id == 0 {
            return Err(FetchError::InvalidMovieId(movie_id));
        }

        let url = packet_address(&self.config.base_url, source, model, movie_id, index);
        debug!(movie_id, %source, %model, index, "Fetching packet from {}", url);

        let response = self
            .with_retry(|| async {
                let response = self.http.get(&url).send().await.map_err(|e| {
                    FetchError::Network {
                        movie_id,
                        source_type: source,
                        model,
                        index,
                        reason: e.to_string(),
                    }
                })?;

                let status = response.status();
                if status.as_u16() >= 500 || status.as_u16() == 429 {
                    return Err(FetchError::RequestFailed {
                        movie_id,
                        source_type: source,
                        model,
                        index,
                        status: status.as_u16(),
                    });
                }
                Ok(response)
            })
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(movie_id, index, "Packet store exhausted");
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(FetchError::RequestFailed {
                movie_id,
                source_type: source,
                model,
                index,
                status: response.status().as_u16(),
            });
        }

        let packet: FeaturePacket =
            response.json().await.map_err(|e| FetchError::MalformedPacket {
                movie_id,
                source_type: source,
                model,
                index,
                reason: e.to_string(),
            })?;

        self.validate_packet(&packet, source, model, movie_id, index)?;
        Ok(Some(packet))
    }

    /// Fetch the complete packet sequence for one movie.
    pub async fn fetch_all_packets(
        &self,
        source: SourceType,
        model: FeatureModel,
        movie_id: u32,
    ) -> FetchResult<Vec<FeaturePacket>> {
        let mut stream = self.stream(source, model, movie_id)?;
        let mut packets = Vec::new();
        while let Some(packet) = stream.next().await? {
            packets.push(packet);
        }
        Ok(packets)
    }

    /// Fetch complete packet sequences for many movies with bounded
    /// parallelism.
    ///
    /// One movie's fault never aborts the others; each movie's outcome
    /// is returned alongside its id so the caller can decide to retry,
    /// skip, or abort.
    pub async fn fetch_movies(
        &self,
        source: SourceType,
        model: FeatureModel,
        movie_ids: &[u32],
    ) -> Vec<(u32, FetchResult<Vec<FeaturePacket>>)> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel_movies.max(1)));

        let futures: Vec<_> = movie_ids
            .iter()
            .map(|&movie_id| {
                let fetcher = self.clone();
                let semaphore = Arc::clone(&semaphore);
                async move {
                    let _permit = semaphore.acquire().await.expect("semaphore closed");
                    let result = fetcher.fetch_all_packets(source, model, movie_id).await;
                    if let Err(e) = &result {
                        warn!(movie_id, error = %e, "Movie packet fetch failed");
                    }
                    (movie_id, result)
                }
            })
            .collect();

        join_all(futures).await
    }

    /// Check a decoded packet against the request that produced it.
    fn validate_packet(
        &self,
        packet: &FeaturePacket,
        source: SourceType,
        model: FeatureModel,
        movie_id: u32,
        index: u32,
    ) -> FetchResult<()> {
        if packet.sequence_index != index {
            return Err(FetchError::SequenceGap {
                movie_id,
                source_type: source,
                model,
                expected: index,
                got: packet.sequence_index,
            });
        }
        if packet.movie_id != movie_id {
            return Err(FetchError::MalformedPacket {
                movie_id,
                source_type: source,
                model,
                index,
                reason: format!("packet belongs to movie {}", packet.movie_id),
            });
        }
        if !packet.dimensions_match_model() {
            return Err(FetchError::MalformedPacket {
                movie_id,
                source_type: source,
                model,
                index,
                reason: format!(
                    "vector dimension does not match {} ({} expected)",
                    model,
                    model.dimension()
                ),
            });
        }
        Ok(())
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> FetchResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = FetchResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(250 * 2u64.pow(attempt));
                    warn!(
                        "Packet fetch failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| FetchError::Client("retries exhausted".to_string())))
    }
}
