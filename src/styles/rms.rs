use super::RmsSettings;
use crate::frame::amplitude;
use crate::render::surface::Surface;

const RMS_MARGIN: f32 = 8.0;

/// Root-mean-square level per output column.
///
/// Column `x` starts at sample `x * step` where `step = max(1, len / width)`
/// and averages up to `window` consecutive samples, fewer near the end of
/// the buffer. Columns past the end of the buffer read as 0.
pub fn rms_values(samples: &[u8], width: u32, window: u32) -> Vec<f32> {
    let step = (samples.len() / width.max(1) as usize).max(1);
    (0..width as usize)
        .map(|x| {
            let start = x * step;
            let slice = samples.get(start..).unwrap_or(&[]);
            let (sum_sq, count) = slice
                .iter()
                .take(window as usize)
                .map(|&s| amplitude(s))
                .fold((0.0f32, 0usize), |(sum, n), v| (sum + v * v, n + 1));
            (sum_sq / count.max(1) as f32).sqrt()
        })
        .collect()
}

/// Curve vertices; louder columns sit above mid-height.
pub fn rms_points(samples: &[u8], width: u32, height: u32, window: u32) -> Vec<(f32, f32)> {
    let mid = height as f32 / 2.0;
    rms_values(samples, width, window)
        .into_iter()
        .enumerate()
        .map(|(x, rms)| (x as f32, mid - rms * (mid - RMS_MARGIN)))
        .collect()
}

pub fn draw(surface: &mut Surface, samples: &[u8], settings: &RmsSettings) {
    let metrics = surface.metrics();
    let points = rms_points(samples, metrics.width, metrics.height, settings.window);
    surface
        .canvas_mut()
        .stroke_polyline(&points, settings.thickness, settings.color);
}
