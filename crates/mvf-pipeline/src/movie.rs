//! Frame → shot → movie pipeline driver.

use tracing::{debug, info};

use mvf_fetch::PacketStream;
use mvf_models::{AggregatedVector, AggregationScope, PoolingStrategy, Shot};

use crate::aggregate::aggregate;
use crate::error::PipelineResult;
use crate::segmenter::ShotSegmenter;

/// Derived features for one movie.
#[derive(Debug, Clone)]
pub struct MovieFeatures {
    /// Movie the features describe
    pub movie_id: u32,

    /// Number of frames consumed from the stream
    pub frame_count: usize,

    /// Shot partition with pooled representatives
    pub shots: Vec<Shot>,

    /// Movie-level vector pooled over the shot representatives
    pub movie_vector: AggregatedVector,
}

/// Drives one movie's packet stream through segmentation and pooling.
///
/// Segmentation is inherently sequential over the stream, so each
/// movie is consumed by exactly one pass; run different movies on
/// separate tasks for parallelism.
pub struct MoviePipeline {
    segmenter: ShotSegmenter,
    movie_pooling: PoolingStrategy,
}

impl Default for MoviePipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl MoviePipeline {
    /// Create a pipeline with default segmentation and mean pooling.
    pub fn new() -> Self {
        Self {
            segmenter: ShotSegmenter::new(),
            movie_pooling: PoolingStrategy::Mean,
        }
    }

    /// Replace the segmenter configuration.
    pub fn with_segmenter(mut self, segmenter: ShotSegmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    /// Set the movie-level pooling strategy.
    pub fn with_movie_pooling(mut self, pooling: PoolingStrategy) -> Self {
        self.movie_pooling = pooling;
        self
    }

    /// Consume a packet stream and derive the movie's features.
    ///
    /// Packets arrive in sequence order; their frame blocks are
    /// flattened into one ordered stream before segmentation. A fetch
    /// fault propagates with the failing index attached and leaves no
    /// partial state behind.
    pub async fn run(&self, stream: &mut PacketStream) -> PipelineResult<MovieFeatures> {
        let movie_id = stream.movie_id();
        let mut frames: Vec<Vec<f32>> = Vec::new();

        while let Some(packet) = stream.next().await? {
            debug!(
                movie_id,
                sequence_index = packet.sequence_index,
                frames = packet.frame_count(),
                "Consumed packet"
            );
            frames.extend(packet.vectors);
        }

        self.run_on_frames(movie_id, &frames)
    }

    /// Segment and pool an already-materialized frame sequence.
    pub fn run_on_frames<V: AsRef<[f32]>>(
        &self,
        movie_id: u32,
        frames: &[V],
    ) -> PipelineResult<MovieFeatures> {
        let shots = self.segmenter.segment(movie_id, frames)?;
        let movie_vector = self.movie_vector(movie_id, &shots)?;

        info!(
            movie_id,
            frame_count = frames.len(),
            shot_count = shots.len(),
            dimension = movie_vector.dimension(),
            "Derived movie features"
        );

        Ok(MovieFeatures {
            movie_id,
            frame_count: frames.len(),
            shots,
            movie_vector,
        })
    }

    /// Pool shot representatives into the movie-level vector.
    ///
    /// Composes with shot-level pooling: the same reduction machinery
    /// runs at both levels, with independently configured strategies.
    pub fn movie_vector(&self, movie_id: u32, shots: &[Shot]) -> PipelineResult<AggregatedVector> {
        let representatives: Vec<&[f32]> =
            shots.iter().map(|s| s.representative.as_slice()).collect();
        let vector = aggregate(&representatives, self.movie_pooling)?;
        Ok(AggregatedVector {
            movie_id,
            scope: AggregationScope::Movie,
            vector,
        })
    }

    /// Expose each shot's representative as an aggregated vector.
    pub fn shot_vectors(&self, shots: &[Shot]) -> Vec<AggregatedVector> {
        shots
            .iter()
            .map(|s| AggregatedVector {
                movie_id: s.movie_id,
                scope: AggregationScope::Shot,
                vector: s.representative.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mvf_models::AggregationScope;

    #[test]
    fn test_run_on_frames_composes_levels() {
        // Two clean segments; shot representatives are means, movie
        // vector is the mean of the representatives.
        let frames = vec![
            vec![2.0f32, 0.0],
            vec![4.0, 0.0],
            vec![0.0, 6.0],
            vec![0.0, 2.0],
        ];

        let pipeline = MoviePipeline::new()
            .with_segmenter(ShotSegmenter::new().with_threshold(0.5));
        let features = pipeline.run_on_frames(9, &frames).unwrap();

        assert_eq!(features.frame_count, 4);
        assert_eq!(features.shots.len(), 2);
        assert_eq!(features.movie_vector.scope, AggregationScope::Movie);
        // Shot means: [3, 0] and [0, 4]; movie mean: [1.5, 2].
        assert!((features.movie_vector.vector[0] - 1.5).abs() < 1e-5);
        assert!((features.movie_vector.vector[1] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_shot_vectors_carry_scope() {
        let frames = vec![vec![1.0f32, 1.0]];
        let pipeline = MoviePipeline::new();
        let features = pipeline.run_on_frames(3, &frames).unwrap();
        let shot_vectors = pipeline.shot_vectors(&features.shots);
        assert_eq!(shot_vectors.len(), 1);
        assert_eq!(shot_vectors[0].scope, AggregationScope::Shot);
        assert_eq!(shot_vectors[0].movie_id, 3);
    }

    #[test]
    fn test_empty_movie_has_no_movie_vector() {
        let frames: Vec<Vec<f32>> = vec![];
        let pipeline = MoviePipeline::new();
        let err = pipeline.run_on_frames(1, &frames).unwrap_err();
        assert!(matches!(err, crate::PipelineError::EmptyInput));
    }
}
