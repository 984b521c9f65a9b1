//! Pitch-contour rescaling.
//!
//! A clip is moved to a target note by multiplying its whole f0 contour by
//! `target / baseline`, where the baseline is the mean f0 over voiced
//! frames.  Unvoiced frames (`f0 == 0`) stay unvoiced after scaling.

use crate::vocoder::Analysis;

/// Mean of the voiced (`> 0`) frames, or `None` if there are none.
pub fn voiced_mean(f0: &[f64]) -> Option<f64> {
    let (sum, count) = f0
        .iter()
        .filter(|&&v| v > 0.0 && v.is_finite())
        .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Pitch the clip is considered to sit at.
///
/// A silent clip has no voiced frames; it falls back to `target` so the
/// resulting ratio is exactly 1.
pub fn baseline_pitch(f0: &[f64], target: f64) -> f64 {
    match voiced_mean(f0) {
        Some(mean) if mean > 0.0 => mean,
        _ => target,
    }
}

/// Multiply every frame by `ratio`.
pub fn scale_contour(f0: &[f64], ratio: f64) -> Vec<f64> {
    f0.iter().map(|&v| v * ratio).collect()
}

/// Rescale `analysis.f0` in place so its voiced mean lands on `target`.
///
/// Returns the ratio applied.
pub fn shift_to_target(analysis: &mut Analysis, target: f64) -> f64 {
    let ratio = target / baseline_pitch(&analysis.f0, target);
    analysis.f0 = scale_contour(&analysis.f0, ratio);
    ratio
}
