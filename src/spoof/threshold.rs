use super::error::{SpoofError, SpoofResult};

pub(crate) fn check_percentile(percentile: f64) -> SpoofResult<()> {
    if !(0.0..=100.0).contains(&percentile) {
        return Err(SpoofError::InvalidPercentile { value: percentile });
    }
    Ok(())
}

/// P-th percentile of `errors` with linear interpolation between order statistics.
///
/// At most `(100 - P)%` of the samples lie strictly above the result.
pub fn compute_threshold(errors: &[f32], percentile: f64) -> SpoofResult<f64> {
    check_percentile(percentile)?;
    if errors.is_empty() {
        return Err(SpoofError::InsufficientData {
            reason: "no validation errors to derive a threshold from".to_string(),
        });
    }
    if errors.iter().any(|e| !e.is_finite()) {
        return Err(SpoofError::InsufficientData {
            reason: "validation errors contain non-finite values".to_string(),
        });
    }

    let mut sorted: Vec<f64> = errors.iter().map(|&e| e as f64).collect();
    sorted.sort_by(f64::total_cmp);

    let rank = percentile / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Ok(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// `error > threshold`.
#[inline]
pub fn is_spoof(error: f32, threshold: f64) -> bool {
    error as f64 > threshold
}
