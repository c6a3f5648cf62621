//! Distance metrics over frame vectors.

use mvf_models::DistanceMetric;

use crate::error::{PipelineError, PipelineResult};

/// Compute the distance between two frame vectors.
///
/// Both vectors must share one dimension; a mismatch is a structural
/// error, not something to clamp around.
pub fn distance(metric: DistanceMetric, a: &[f32], b: &[f32]) -> PipelineResult<f64> {
    if a.len() != b.len() {
        return Err(PipelineError::dimension_mismatch(a.len(), b.len(), 0));
    }

    Ok(match metric {
        DistanceMetric::Cosine => cosine_distance(a, b),
        DistanceMetric::Euclidean => euclidean_distance(a, b),
    })
}

/// One minus cosine similarity.
///
/// A zero-norm vector has no direction; against anything else it is
/// treated as fully dissimilar (distance 1.0).
fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Euclidean (L2) distance.
fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = *x as f64 - *y as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical_vectors() {
        let d = distance(DistanceMetric::Cosine, &[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]).unwrap();
        assert!(d.abs() < 1e-9, "Identical directions should have ~0 distance");
    }

    #[test]
    fn test_cosine_orthogonal_vectors() {
        let d = distance(DistanceMetric::Cosine, &[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]).unwrap();
        assert!((d - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_scale_invariant() {
        let d = distance(DistanceMetric::Cosine, &[1.0, 2.0], &[10.0, 20.0]).unwrap();
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn test_cosine_zero_norm_is_fully_dissimilar() {
        let d = distance(DistanceMetric::Cosine, &[0.0, 0.0], &[1.0, 0.0]).unwrap();
        assert!((d - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_euclidean() {
        let d = distance(DistanceMetric::Euclidean, &[0.0, 0.0], &[3.0, 4.0]).unwrap();
        assert!((d - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let err = distance(DistanceMetric::Cosine, &[1.0, 0.0], &[1.0]).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DimensionMismatch { expected: 2, got: 1, .. }
        ));
    }
}
