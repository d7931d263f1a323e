use super::{BarsSettings, MirroredSettings, Rect};
use crate::frame::amplitude;
use crate::render::surface::Surface;

/// Vertical inset between a full-scale bar and the surface edge.
pub const BAR_MARGIN: f32 = 6.0;

/// Horizontal stride of one column bucket; never narrower than 2px.
pub fn bar_width(width: u32, columns: u32) -> u32 {
    (width / columns.max(1)).max(2)
}

/// `(x, half_height)` for each column bucket, sampled from the time-domain
/// buffer with the same nearest-neighbour rule as the line style.
pub fn bar_heights(
    samples: &[u8],
    width: u32,
    height: u32,
    columns: u32,
    sensitivity: f32,
) -> Vec<(f32, f32)> {
    if samples.is_empty() || width == 0 {
        return Vec::new();
    }
    let mid = height as f32 / 2.0;
    let stride = bar_width(width, columns);
    (0..width)
        .step_by(stride as usize)
        .map(|x| {
            let idx = ((x as f64 / width as f64) * samples.len() as f64) as usize;
            let sample = samples[idx.min(samples.len() - 1)];
            let v = (amplitude(sample) * sensitivity).abs();
            (x as f32, v * (mid - BAR_MARGIN))
        })
        .collect()
}

/// One rectangle per bucket, symmetric about mid-height.
pub fn bar_rects(samples: &[u8], width: u32, height: u32, settings: &BarsSettings) -> Vec<Rect> {
    let mid = height as f32 / 2.0;
    let w = bar_width(width, settings.columns) as f32 - 1.0;
    bar_heights(samples, width, height, settings.columns, settings.sensitivity)
        .into_iter()
        .map(|(x, h)| Rect {
            x,
            y: mid - h,
            w,
            h: h * 2.0,
        })
        .collect()
}

/// Two rectangles per bucket: one rising from mid-height, one hanging below.
pub fn mirrored_rects(
    samples: &[u8],
    width: u32,
    height: u32,
    settings: &MirroredSettings,
) -> Vec<Rect> {
    let mid = height as f32 / 2.0;
    let w = bar_width(width, settings.columns) as f32 - 1.0;
    bar_heights(samples, width, height, settings.columns, settings.sensitivity)
        .into_iter()
        .flat_map(|(x, h)| [Rect { x, y: mid - h, w, h }, Rect { x, y: mid, w, h }])
        .collect()
}

pub fn draw(surface: &mut Surface, samples: &[u8], settings: &BarsSettings) {
    let metrics = surface.metrics();
    let canvas = surface.canvas_mut();
    for r in bar_rects(samples, metrics.width, metrics.height, settings) {
        canvas.fill_rect(r.x, r.y, r.w, r.h, settings.color);
    }
}

pub fn draw_mirrored(surface: &mut Surface, samples: &[u8], settings: &MirroredSettings) {
    let metrics = surface.metrics();
    let canvas = surface.canvas_mut();
    for r in mirrored_rects(samples, metrics.width, metrics.height, settings) {
        canvas.fill_rect(r.x, r.y, r.w, r.h, settings.color);
    }
}
