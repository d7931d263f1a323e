use super::LineSettings;
use crate::frame::amplitude;
use crate::render::surface::Surface;

/// Vertical inset between full-scale amplitude and the surface edge.
pub const LINE_MARGIN: f32 = 8.0;

/// Nearest-neighbour decimation: the sample shown in pixel column `x`.
pub(crate) fn sample_for_column(samples: &[u8], x: u32, width: u32) -> u8 {
    let idx = (x as f64 * samples.len() as f64 / width.max(1) as f64) as usize;
    samples[idx.min(samples.len() - 1)]
}

/// One vertex per pixel column, scaled about mid-height.
pub fn line_points(samples: &[u8], width: u32, height: u32, sensitivity: f32) -> Vec<(f32, f32)> {
    if samples.is_empty() || width == 0 {
        return Vec::new();
    }
    let mid = height as f32 / 2.0;
    (0..width)
        .map(|x| {
            let v = amplitude(sample_for_column(samples, x, width)) * sensitivity;
            (x as f32, mid + v * (mid - LINE_MARGIN))
        })
        .collect()
}

pub fn draw(surface: &mut Surface, samples: &[u8], settings: &LineSettings) {
    let metrics = surface.metrics();
    let points = line_points(samples, metrics.width, metrics.height, settings.sensitivity);
    surface
        .canvas_mut()
        .stroke_polyline(&points, settings.thickness, settings.color);
}
