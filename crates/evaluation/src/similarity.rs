use crate::{EvaluationError, EvaluationResult};

fn l2_norm(v: &[f32]) -> f64 {
    v.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt()
}

/// Cosine similarity of two vectors, in `[-1, 1]`.
///
/// A zero vector is similar to nothing and scores 0.
///
/// # Errors
///
/// Returns `EvaluationError::DimensionMismatch` if the vectors differ in length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> EvaluationResult<f64> {
    if a.len() != b.len() {
        return Err(EvaluationError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    let dot: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();
    let denom = l2_norm(a) * l2_norm(b);
    if denom < f64::EPSILON {
        return Ok(0.0);
    }
    Ok((dot / denom).clamp(-1.0, 1.0))
}

/// Mean of the values, or 0 for none.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Fraction of values strictly above `threshold`, or 0 for none.
pub(crate) fn fraction_above(values: &[f64], threshold: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|v| **v > threshold).count() as f64 / values.len() as f64
}
