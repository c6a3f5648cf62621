//! Shot boundary segmentation over a frame-level feature stream.
//!
//! # Algorithm
//!
//! 1. One forward pass comparing each frame to its predecessor with the
//!    configured distance metric; a distance above the threshold closes
//!    the current shot at the previous frame and opens a new one.
//! 2. One bounded backward merge pass: every shot shorter than the
//!    configured floor is folded into the neighbor with the smaller
//!    boundary distance (tie: the preceding shot).
//! 3. Each surviving shot gets a pooled representative vector.
//!
//! The scan needs only the previous frame in memory; the merge pass is
//! the only step that touches the materialized boundary list.

use tracing::{debug, info};

use mvf_models::{DistanceMetric, PoolingStrategy, Shot};

use crate::aggregate::aggregate;
use crate::distance::distance;
use crate::error::{PipelineError, PipelineResult};

/// Shot boundary segmenter with similarity thresholding.
pub struct ShotSegmenter {
    /// Distance metric between consecutive frames (default: cosine).
    metric: DistanceMetric,

    /// Boundary threshold (default: 0.5). Higher values = fewer cuts.
    threshold: f64,

    /// Minimum frames per shot after merging (default: 1).
    min_shot_len: usize,

    /// Pooling used for each shot's representative vector.
    representative_pooling: PoolingStrategy,
}

impl Default for ShotSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl ShotSegmenter {
    /// Create a segmenter with default settings.
    pub fn new() -> Self {
        Self {
            metric: DistanceMetric::Cosine,
            threshold: 0.5,
            min_shot_len: 1,
            representative_pooling: PoolingStrategy::Mean,
        }
    }

    /// Set the distance metric.
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Set the boundary threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the minimum shot length in frames.
    pub fn with_min_shot_len(mut self, min_shot_len: usize) -> Self {
        self.min_shot_len = min_shot_len.max(1);
        self
    }

    /// Set the pooling strategy for shot representatives.
    pub fn with_representative_pooling(mut self, pooling: PoolingStrategy) -> Self {
        self.representative_pooling = pooling;
        self
    }

    /// Partition a movie's ordered frame vectors into shots.
    ///
    /// The result is always a contiguous, non-overlapping partition of
    /// `[0, frames.len() - 1]`. An empty stream yields no shots; a
    /// single frame yields one shot of length 1 regardless of the
    /// threshold.
    pub fn segment<V: AsRef<[f32]>>(
        &self,
        movie_id: u32,
        frames: &[V],
    ) -> PipelineResult<Vec<Shot>> {
        if frames.is_empty() {
            return Ok(Vec::new());
        }

        let dimension = frames[0].as_ref().len();
        for (position, frame) in frames.iter().enumerate().skip(1) {
            if frame.as_ref().len() != dimension {
                return Err(PipelineError::dimension_mismatch(
                    dimension,
                    frame.as_ref().len(),
                    position,
                ));
            }
        }

        let (mut spans, mut cut_distances) = self.forward_scan(frames)?;
        self.merge_short_spans(&mut spans, &mut cut_distances);

        let mut shots = Vec::with_capacity(spans.len());
        for (start, end) in spans {
            let representative =
                aggregate(&frames[start..=end], self.representative_pooling)?;
            shots.push(Shot {
                movie_id,
                start_index: start,
                end_index: end,
                representative,
            });
        }

        info!(
            movie_id,
            frame_count = frames.len(),
            shot_count = shots.len(),
            "Segmented movie into shots"
        );
        Ok(shots)
    }

    /// One-pass boundary detection.
    ///
    /// Returns the shot spans plus the boundary distance between each
    /// adjacent span pair (needed by the merge pass).
    fn forward_scan<V: AsRef<[f32]>>(
        &self,
        frames: &[V],
    ) -> PipelineResult<(Vec<(usize, usize)>, Vec<f64>)> {
        let mut spans: Vec<(usize, usize)> = Vec::new();
        let mut cut_distances: Vec<f64> = Vec::new();
        let mut start = 0usize;

        for i in 1..frames.len() {
            let d = distance(self.metric, frames[i - 1].as_ref(), frames[i].as_ref())?;
            if d > self.threshold {
                debug!(
                    "Shot boundary at frame {} (distance={:.3}, threshold={:.3})",
                    i, d, self.threshold
                );
                spans.push((start, i - 1));
                cut_distances.push(d);
                start = i;
            }
        }

        // The final shot always closes at the last frame, even when no
        // boundary fired.
        spans.push((start, frames.len() - 1));
        Ok((spans, cut_distances))
    }

    /// Fold spans shorter than the floor into a neighbor.
    ///
    /// Scans from the last span backward; each merge removes one span,
    /// so the pass is bounded by the initial span count. A lone span
    /// has no neighbor and is kept whatever its length.
    fn merge_short_spans(&self, spans: &mut Vec<(usize, usize)>, cut_distances: &mut Vec<f64>) {
        if self.min_shot_len <= 1 {
            return;
        }

        let span_len = |span: &(usize, usize)| span.1 - span.0 + 1;

        let mut i = spans.len();
        while i > 0 && spans.len() > 1 {
            i -= 1;
            if i >= spans.len() || span_len(&spans[i]) >= self.min_shot_len {
                continue;
            }

            let merge_into_preceding = if i == 0 {
                false
            } else if i == spans.len() - 1 {
                true
            } else {
                // Neighbor with the smaller boundary distance wins;
                // ties go to the preceding shot.
                cut_distances[i - 1] <= cut_distances[i]
            };

            if merge_into_preceding {
                spans[i - 1].1 = spans[i].1;
                spans.remove(i);
                cut_distances.remove(i - 1);
            } else {
                spans[i + 1].0 = spans[i].0;
                spans.remove(i);
                cut_distances.remove(i);
                // The grown following span may itself still be short;
                // revisit it on the next iteration.
                i += 1;
            }
        }
    }
}
