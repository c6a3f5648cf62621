//! Pull-based packet stream.

use mvf_models::{FeatureModel, FeaturePacket, SourceType};

use crate::client::PacketFetcher;
use crate::error::FetchResult;

/// Terminal state of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    /// More packets may follow
    Active,
    /// Store ran out of packets; the stream ended normally
    Exhausted,
    /// A fetch fault ended the stream at the last good index
    Faulted,
}

/// In-order, lazy packet stream for one movie.
///
/// `next()` returns `Ok(Some(packet))` for each packet in sequence
/// order, `Ok(None)` once the store is exhausted, and `Err` on a fetch
/// fault. After either terminal state the stream stays finished; a
/// fresh call to [`PacketFetcher::stream`] restarts from packet 0.
#[derive(Debug)]
pub struct PacketStream {
    fetcher: PacketFetcher,
    source: SourceType,
    model: FeatureModel,
    movie_id: u32,
    next_index: u32,
    state: StreamState,
}

impl PacketStream {
    pub(crate) fn new(
        fetcher: PacketFetcher,
        source: SourceType,
        model: FeatureModel,
        movie_id: u32,
    ) -> Self {
        Self {
            fetcher,
            source,
            model,
            movie_id,
            next_index: 0,
            state: StreamState::Active,
        }
    }

    /// Movie the stream belongs to.
    pub fn movie_id(&self) -> u32 {
        self.movie_id
    }

    /// Source of the stream.
    pub fn source(&self) -> SourceType {
        self.source
    }

    /// Model of the stream.
    pub fn model(&self) -> FeatureModel {
        self.model
    }

    /// Index the next `next()` call will fetch.
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    /// Whether the stream ended because of a fetch fault rather than
    /// normal exhaustion.
    pub fn is_faulted(&self) -> bool {
        self.state == StreamState::Faulted
    }

    /// Fetch the next packet.
    pub async fn next(&mut self) -> FetchResult<Option<FeaturePacket>> {
        if self.state != StreamState::Active {
            return Ok(None);
        }

        match self
            .fetcher
            .fetch_packet(self.source, self.model, self.movie_id, self.next_index)
            .await
        {
            Ok(Some(packet)) => {
                self.next_index += 1;
                Ok(Some(packet))
            }
            Ok(None) => {
                self.state = StreamState::Exhausted;
                Ok(None)
            }
            Err(e) => {
                self.state = StreamState::Faulted;
                Err(e)
            }
        }
    }

    /// Drain the remaining packets into a vector.
    pub async fn collect_remaining(&mut self) -> FetchResult<Vec<FeaturePacket>> {
        let mut packets = Vec::new();
        while let Some(packet) = self.next().await? {
            packets.push(packet);
        }
        Ok(packets)
    }
}
