//! Multimodal fusion of textual and visual vectors.

use tracing::debug;

use mvf_models::{FusedVector, FusionPolicy, MissingModalityPolicy, ModalityMask};

use crate::error::{FusionError, FusionResult};

/// Combines a movie's textual and visual vectors into one fused
/// representation.
///
/// Expected dimensions are part of the configuration; every input is
/// checked against them, and the fused dimension is therefore constant
/// across the whole output regardless of which modalities were present
/// for a given movie.
#[derive(Debug)]
pub struct Fuser {
    policy: FusionPolicy,
    missing: MissingModalityPolicy,
    textual_dim: usize,
    visual_dim: usize,
    weights: (f64, f64),
}

impl Fuser {
    /// Create a fuser.
    ///
    /// Weighted-sum fusion requires the two modalities to share one
    /// dimension; that misconfiguration is rejected here rather than
    /// surfacing per movie.
    pub fn new(
        policy: FusionPolicy,
        missing: MissingModalityPolicy,
        textual_dim: usize,
        visual_dim: usize,
    ) -> FusionResult<Self> {
        if textual_dim == 0 || visual_dim == 0 {
            return Err(FusionError::EmptyDimensions);
        }
        if policy == FusionPolicy::WeightedSum && textual_dim != visual_dim {
            return Err(FusionError::WeightedSumDimensions {
                textual_dim,
                visual_dim,
            });
        }

        Ok(Self {
            policy,
            missing,
            textual_dim,
            visual_dim,
            weights: (0.5, 0.5),
        })
    }

    /// Set the weight pair for weighted-sum fusion.
    pub fn with_weights(mut self, textual: f64, visual: f64) -> Self {
        self.weights = (textual, visual);
        self
    }

    /// Dimension every emitted fused vector will have.
    pub fn fused_dimension(&self) -> usize {
        match self.policy {
            FusionPolicy::Concat => self.textual_dim + self.visual_dim,
            FusionPolicy::WeightedSum => self.textual_dim,
        }
    }

    /// Fuse one movie's modalities.
    ///
    /// Returns `Ok(None)` when the movie is dropped: either no
    /// modality is present, or exactly one is and the missing-modality
    /// policy is `exclude`. A fused vector is never emitted undersized.
    pub fn fuse(
        &self,
        movie_id: u32,
        textual: Option<&[f32]>,
        visual: Option<&[f32]>,
    ) -> FusionResult<Option<FusedVector>> {
        if let Some(t) = textual {
            if t.len() != self.textual_dim {
                return Err(FusionError::DimensionMismatch {
                    movie_id,
                    modality: "textual",
                    expected: self.textual_dim,
                    got: t.len(),
                });
            }
        }
        if let Some(v) = visual {
            if v.len() != self.visual_dim {
                return Err(FusionError::DimensionMismatch {
                    movie_id,
                    modality: "visual",
                    expected: self.visual_dim,
                    got: v.len(),
                });
            }
        }

        let modalities = ModalityMask::new(textual.is_some(), visual.is_some());
        if modalities.is_empty() {
            return Ok(None);
        }
        if !modalities.is_complete() && self.missing == MissingModalityPolicy::Exclude {
            debug!(movie_id, "Dropping movie with partial modality coverage");
            return Ok(None);
        }

        // Zero-fill the absent side; the mask still records what
        // genuinely contributed.
        let zero_textual;
        let textual = match textual {
            Some(t) => t,
            None => {
                zero_textual = vec![0.0f32; self.textual_dim];
                &zero_textual
            }
        };
        let zero_visual;
        let visual = match visual {
            Some(v) => v,
            None => {
                zero_visual = vec![0.0f32; self.visual_dim];
                &zero_visual
            }
        };

        let fused = match self.policy {
            FusionPolicy::Concat => {
                let mut fused = Vec::with_capacity(self.textual_dim + self.visual_dim);
                fused.extend_from_slice(textual);
                fused.extend_from_slice(visual);
                fused
            }
            FusionPolicy::WeightedSum => {
                let (wt, wv) = self.weights;
                textual
                    .iter()
                    .zip(visual.iter())
                    .map(|(t, v)| (*t as f64 * wt + *v as f64 * wv) as f32)
                    .collect()
            }
        };

        Ok(Some(FusedVector {
            movie_id,
            fused,
            modalities,
        }))
    }

    /// Fuse a batch of movies, skipping the dropped ones.
    ///
    /// Pure per movie, so callers may also shard the batch across
    /// tasks; a structural error on any movie aborts the batch.
    pub fn fuse_all(
        &self,
        movies: &[(u32, Option<Vec<f32>>, Option<Vec<f32>>)],
    ) -> FusionResult<Vec<FusedVector>> {
        let mut fused = Vec::with_capacity(movies.len());
        for (movie_id, textual, visual) in movies {
            if let Some(vector) =
                self.fuse(*movie_id, textual.as_deref(), visual.as_deref())?
            {
                fused.push(vector);
            }
        }
        Ok(fused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concat_fuser(missing: MissingModalityPolicy) -> Fuser {
        Fuser::new(FusionPolicy::Concat, missing, 3, 2).unwrap()
    }

    #[test]
    fn test_concat_both_modalities() {
        let fuser = concat_fuser(MissingModalityPolicy::ZeroFill);
        let fused = fuser
            .fuse(1, Some(&[1.0, 2.0, 3.0]), Some(&[4.0, 5.0]))
            .unwrap()
            .unwrap();
        assert_eq!(fused.fused, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(fused.modalities.is_complete());
        assert_eq!(fused.dimension(), fuser.fused_dimension());
    }

    #[test]
    fn test_zero_fill_round_trip() {
        let fuser = concat_fuser(MissingModalityPolicy::ZeroFill);
        let textual = [1.0f32, 2.0, 3.0];

        let filled = fuser.fuse(1, Some(&textual), None).unwrap().unwrap();
        let explicit = fuser
            .fuse(1, Some(&textual), Some(&[0.0, 0.0]))
            .unwrap()
            .unwrap();

        // The textual-derived portion matches an explicit zero visual
        // vector; only the mask differs.
        assert_eq!(filled.fused, explicit.fused);
        assert_eq!(filled.fused[..3], textual);
        assert_eq!(filled.modalities, ModalityMask::new(true, false));
        assert!(explicit.modalities.is_complete());
    }

    #[test]
    fn test_exclude_drops_partial_movies() {
        let fuser = concat_fuser(MissingModalityPolicy::Exclude);
        assert!(fuser.fuse(1, Some(&[1.0, 2.0, 3.0]), None).unwrap().is_none());
        assert!(fuser.fuse(1, None, Some(&[1.0, 2.0])).unwrap().is_none());
        // Both present still fuses.
        assert!(fuser
            .fuse(1, Some(&[1.0, 2.0, 3.0]), Some(&[0.5, 0.5]))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_no_modalities_is_dropped_under_either_policy() {
        for missing in [MissingModalityPolicy::ZeroFill, MissingModalityPolicy::Exclude] {
            let fuser = concat_fuser(missing);
            assert!(fuser.fuse(1, None, None).unwrap().is_none());
        }
    }

    #[test]
    fn test_weighted_sum() {
        let fuser = Fuser::new(
            FusionPolicy::WeightedSum,
            MissingModalityPolicy::ZeroFill,
            2,
            2,
        )
        .unwrap()
        .with_weights(0.25, 0.75);

        let fused = fuser
            .fuse(1, Some(&[4.0, 0.0]), Some(&[0.0, 4.0]))
            .unwrap()
            .unwrap();
        assert!((fused.fused[0] - 1.0).abs() < 1e-6);
        assert!((fused.fused[1] - 3.0).abs() < 1e-6);
        assert_eq!(fused.dimension(), 2);
    }

    #[test]
    fn test_weighted_sum_rejects_unequal_dims_at_construction() {
        let err = Fuser::new(
            FusionPolicy::WeightedSum,
            MissingModalityPolicy::ZeroFill,
            3,
            2,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            FusionError::WeightedSumDimensions { textual_dim: 3, visual_dim: 2 }
        ));
    }

    #[test]
    fn test_dimension_mismatch_carries_context() {
        let fuser = concat_fuser(MissingModalityPolicy::ZeroFill);
        let err = fuser.fuse(42, Some(&[1.0]), None).unwrap_err();
        match err {
            FusionError::DimensionMismatch {
                movie_id,
                modality,
                expected,
                got,
            } => {
                assert_eq!(movie_id, 42);
                assert_eq!(modality, "textual");
                assert_eq!(expected, 3);
                assert_eq!(got, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_fuse_all_skips_dropped_and_keeps_dimension() {
        let fuser = concat_fuser(MissingModalityPolicy::Exclude);
        let movies = vec![
            (1, Some(vec![1.0, 0.0, 0.0]), Some(vec![1.0, 1.0])),
            (2, Some(vec![0.0, 1.0, 0.0]), None),
            (3, None, None),
        ];
        let fused = fuser.fuse_all(&movies).unwrap();
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].movie_id, 1);
        assert!(fused.iter().all(|f| f.dimension() == fuser.fused_dimension()));
    }
}
