use serde::Serialize;

use super::error::{EvaluationError, EvaluationResult};

/// Threshold count used for EER, ROC and DET sweeps.
pub const SWEEP_POINTS: usize = 1000;

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            out[n - 1] = end;
            out
        }
    }
}

fn check(scores: &[f32], which: &'static str) -> EvaluationResult<()> {
    if scores.is_empty() {
        return Err(EvaluationError::EmptyScores { which });
    }
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(EvaluationError::NonFinite);
    }
    Ok(())
}

fn fraction(scores: &[f32], pred: impl Fn(f64) -> bool) -> f64 {
    scores.iter().filter(|&&s| pred(s as f64)).count() as f64 / scores.len() as f64
}

/// FAR and FRR at each threshold.
pub fn far_frr(
    genuine: &[f32],
    impostor: &[f32],
    thresholds: &[f64],
) -> EvaluationResult<(Vec<f64>, Vec<f64>)> {
    check(genuine, "genuine")?;
    check(impostor, "impostor")?;
    let far = thresholds
        .iter()
        .map(|&t| fraction(impostor, |s| s >= t))
        .collect();
    let frr = thresholds
        .iter()
        .map(|&t| fraction(genuine, |s| s < t))
        .collect();
    Ok((far, frr))
}

fn pooled_sweep(genuine: &[f32], impostor: &[f32], n: usize) -> Vec<f64> {
    let (lo, hi) = genuine
        .iter()
        .chain(impostor)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| {
            (lo.min(s as f64), hi.max(s as f64))
        });
    linspace(lo, hi, n)
}

/// Piecewise-linear interpolation of `ys` over ascending `xs`.
fn interp(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len();
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[n - 1] {
        return ys[n - 1];
    }
    let hi = xs.partition_point(|&v| v <= x);
    let lo = hi - 1;
    let t = (x - xs[lo]) / (xs[hi] - xs[lo]);
    ys[lo] + t * (ys[hi] - ys[lo])
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EqualErrorRate {
    pub eer: f64,
    pub threshold: f64,
}

/// Equal error rate over a 1000-point sweep of the pooled score range.
///
/// The FAR/FRR crossing is located by linear interpolation between the
/// thresholds bracketing the closest sweep point. Without a sign change there,
/// the closest point's threshold and mean of FAR and FRR are reported.
pub fn equal_error_rate(genuine: &[f32], impostor: &[f32]) -> EvaluationResult<EqualErrorRate> {
    let thresholds = pooled_sweep(genuine, impostor, SWEEP_POINTS);
    let (far, frr) = far_frr(genuine, impostor, &thresholds)?;
    let diff: Vec<f64> = far.iter().zip(&frr).map(|(a, r)| a - r).collect();

    let min_idx = diff
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |best, (i, d)| {
            if d.abs() < best.1 { (i, d.abs()) } else { best }
        })
        .0;

    let fallback = EqualErrorRate {
        eer: (far[min_idx] + frr[min_idx]) / 2.0,
        threshold: thresholds[min_idx],
    };
    if min_idx == 0 || min_idx + 1 >= thresholds.len() {
        return Ok(fallback);
    }

    let (a, b) = (min_idx - 1, min_idx + 1);
    let (fa, fb) = (diff[a], diff[b]);
    let crossing = if fa * fb > 0.0 {
        None
    } else if fa == 0.0 {
        Some(thresholds[a])
    } else if fb == 0.0 {
        Some(thresholds[b])
    } else {
        let (lo, hi) = if diff[a] * diff[min_idx] <= 0.0 {
            (a, min_idx)
        } else {
            (min_idx, b)
        };
        let (d0, d1) = (diff[lo], diff[hi]);
        let (t0, t1) = (thresholds[lo], thresholds[hi]);
        Some(if d0 == d1 { t0 } else { t0 + (t1 - t0) * d0 / (d0 - d1) })
    };

    Ok(match crossing {
        Some(threshold) => EqualErrorRate {
            eer: interp(threshold, &thresholds, &far),
            threshold,
        },
        None => fallback,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccuracyAtThreshold {
    pub accuracy: f64,
    pub genuine_accept_rate: f64,
    pub impostor_reject_rate: f64,
}

pub fn accuracy_at_threshold(
    genuine: &[f32],
    impostor: &[f32],
    threshold: f64,
) -> EvaluationResult<AccuracyAtThreshold> {
    check(genuine, "genuine")?;
    check(impostor, "impostor")?;
    let genuine_accept_rate = fraction(genuine, |s| s >= threshold);
    let impostor_reject_rate = fraction(impostor, |s| s < threshold);
    let (ng, ni) = (genuine.len() as f64, impostor.len() as f64);
    Ok(AccuracyAtThreshold {
        accuracy: (genuine_accept_rate * ng + impostor_reject_rate * ni) / (ng + ni),
        genuine_accept_rate,
        impostor_reject_rate,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct RocCurve {
    pub far: Vec<f64>,
    /// True accept rate, `1 - FRR`.
    pub tar: Vec<f64>,
    pub thresholds: Vec<f64>,
}

pub fn roc_curve(genuine: &[f32], impostor: &[f32], n_points: usize) -> EvaluationResult<RocCurve> {
    if n_points < 2 {
        return Err(EvaluationError::InvalidInput {
            reason: format!("a curve needs at least 2 points, got {}", n_points),
        });
    }
    let thresholds = pooled_sweep(genuine, impostor, n_points);
    let (far, frr) = far_frr(genuine, impostor, &thresholds)?;
    Ok(RocCurve {
        far,
        tar: frr.into_iter().map(|r| 1.0 - r).collect(),
        thresholds,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct DetCurve {
    pub far: Vec<f64>,
    pub frr: Vec<f64>,
}

pub fn det_curve(genuine: &[f32], impostor: &[f32], n_points: usize) -> EvaluationResult<DetCurve> {
    let roc = roc_curve(genuine, impostor, n_points)?;
    Ok(DetCurve {
        frr: roc.tar.iter().map(|t| 1.0 - t).collect(),
        far: roc.far,
    })
}
