/// Number of bars in the static waveform preview.
pub const DEFAULT_PEAK_BARS: usize = 1500;

/// Smallest divisor used when normalising, so silence maps to all zeros.
const NORMALISE_FLOOR: f32 = 1e-4;

/// Reduce a whole track to at most about `target_bars` peak values in [0, 1].
///
/// Samples are split into contiguous windows of `max(1, len / target_bars)`
/// samples; a trailing partial window is dropped. Each output is the window's
/// largest absolute sample, divided by the largest of all outputs.
pub fn compute_peaks(samples: &[f32], target_bars: usize) -> Vec<f32> {
    let per_bar = (samples.len() / target_bars.max(1)).max(1);
    let mut peaks: Vec<f32> = samples
        .chunks_exact(per_bar)
        .map(|window| window.iter().fold(0.0f32, |peak, s| peak.max(s.abs())))
        .collect();

    let max = peaks.iter().copied().fold(NORMALISE_FLOOR, f32::max);
    for peak in &mut peaks {
        *peak = (*peak / max).min(1.0);
    }
    peaks
}
