use std::f32::consts::TAU;

use super::CircularSettings;
use crate::render::surface::Surface;

/// Share of the base radius every spoke gets regardless of magnitude.
const SPOKE_FLOOR: f32 = 0.2;

/// A radial line segment from the inner ring outwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spoke {
    pub from: (f32, f32),
    pub to: (f32, f32),
}

/// Inner ring radius for a surface of the given logical size.
pub fn base_radius(width: u32, height: u32, radius_scale: f32) -> f32 {
    let cx = width / 2;
    let cy = height / 2;
    cx.min(cy) as f32 * radius_scale
}

/// One spoke per angular segment, in surface coordinates. Bins are mapped
/// onto segments by nearest-lower index; missing bins read as silence.
pub fn spokes(magnitudes: &[u8], width: u32, height: u32, settings: &CircularSettings) -> Vec<Spoke> {
    let segments = settings.segments;
    if segments == 0 {
        return Vec::new();
    }
    let cx = (width / 2) as f32;
    let cy = (height / 2) as f32;
    let radius = base_radius(width, height, settings.radius_scale);

    (0..segments)
        .map(|i| {
            let frac = i as f32 / segments as f32;
            let idx = (frac * magnitudes.len() as f32) as usize;
            let raw = magnitudes.get(idx).copied().unwrap_or(0);
            let mag = (raw as f32 / 255.0 * settings.sensitivity).clamp(0.0, 1.0);
            let len = radius * SPOKE_FLOOR + mag * radius * (1.0 - SPOKE_FLOOR);

            let (sin, cos) = (frac * TAU).sin_cos();
            Spoke {
                from: (cx + cos * radius, cy + sin * radius),
                to: (cx + cos * (radius + len), cy + sin * (radius + len)),
            }
        })
        .collect()
}

pub fn draw(surface: &mut Surface, magnitudes: &[u8], settings: &CircularSettings) {
    let metrics = surface.metrics();
    let canvas = surface.canvas_mut();
    for spoke in spokes(magnitudes, metrics.width, metrics.height, settings) {
        canvas.stroke_line(spoke.from, spoke.to, settings.thickness, settings.color);
    }
}
