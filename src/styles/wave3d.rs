//! Faux-3D ridge: the waveform repeated as stacked, gradient-filled layers.

use super::line::sample_for_column;
use super::Wave3dSettings;
use crate::frame::amplitude;
use crate::render::canvas::Paint;
use crate::render::color::Rgb;
use crate::render::surface::Surface;

const RIDGE_MARGIN: f32 = 10.0;
/// Half-height of each layer's gradient band around mid-height.
const GRADIENT_SPAN: f32 = 60.0;
const RIM_STEP: usize = 2;

/// Placement and colours of one ridge layer. Layer 0 is the front.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Layer {
    pub index: u32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub top: Rgb,
    pub bottom: Rgb,
    pub rim_width: f32,
}

/// Layers in draw order, back to front.
pub fn layer_plan(settings: &Wave3dSettings) -> Vec<Layer> {
    let layers = settings.layers;
    if layers == 0 {
        return Vec::new();
    }
    let back = (layers - 1) as f32;
    (0..layers)
        .rev()
        .map(|i| {
            let shift = i as f32 - back;
            let t = i as f32 / back.max(1.0);
            Layer {
                index: i,
                offset_x: (shift * settings.tilt * 10.0).round(),
                offset_y: (shift * settings.depth).round(),
                top: settings.highlight.lerp(settings.color, t),
                bottom: settings.color.lerp(settings.shadow, t),
                rim_width: if i == 0 { 2.0 } else { 1.0 },
            }
        })
        .collect()
}

/// Base ridge heights, one per pixel column.
pub fn ridge_heights(samples: &[u8], width: u32, height: u32, sensitivity: f32) -> Vec<f32> {
    if samples.is_empty() || width == 0 {
        return Vec::new();
    }
    let mid = (height / 2) as f32;
    (0..width)
        .map(|x| {
            let v = amplitude(sample_for_column(samples, x, width)) * sensitivity;
            mid + v * (mid - RIDGE_MARGIN)
        })
        .collect()
}

pub fn draw(surface: &mut Surface, samples: &[u8], settings: &Wave3dSettings) {
    let metrics = surface.metrics();
    let ridge = ridge_heights(samples, metrics.width, metrics.height, settings.sensitivity);
    if ridge.is_empty() {
        return;
    }
    let width = metrics.width as f32;
    let height = metrics.height as f32;
    let mid = (metrics.height / 2) as f32;
    let canvas = surface.canvas_mut();

    for layer in layer_plan(settings) {
        let (dx, dy) = (layer.offset_x, layer.offset_y);

        let mut outline = Vec::with_capacity(ridge.len() + 2);
        outline.push((dx, height + 2.0));
        outline.extend(ridge.iter().enumerate().map(|(x, &y)| (x as f32 + dx, y + dy)));
        outline.push((width + dx, height + 2.0));
        canvas.fill_polygon(
            &outline,
            Paint::VerticalGradient {
                y0: mid - GRADIENT_SPAN + dy,
                y1: mid + GRADIENT_SPAN + dy,
                from: layer.top,
                to: layer.bottom,
            },
        );

        let rim: Vec<(f32, f32)> = ridge
            .iter()
            .enumerate()
            .step_by(RIM_STEP)
            .map(|(x, &y)| (x as f32 + dx, y + dy))
            .collect();
        canvas.stroke_polyline(&rim, layer.rim_width, layer.top);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::surface::Viewport;

    #[test]
    fn layers_are_drawn_back_to_front() {
        let plan = layer_plan(&Wave3dSettings::default());
        let order: Vec<u32> = plan.iter().map(|l| l.index).collect();
        assert_eq!(order, (0..12).rev().collect::<Vec<_>>());

        let back = plan[0];
        assert_eq!((back.offset_x, back.offset_y), (0.0, 0.0));
        let front = plan[11];
        assert_eq!(front.offset_y, -88.0);
        assert_eq!(front.offset_x, -44.0);
    }

    #[test]
    fn only_the_front_layer_gets_a_wide_rim() {
        let plan = layer_plan(&Wave3dSettings::default());
        let wide: Vec<u32> = plan.iter().filter(|l| l.rim_width > 1.0).map(|l| l.index).collect();
        assert_eq!(wide, vec![0]);
    }

    #[test]
    fn gradient_endpoints_follow_depth() {
        let settings = Wave3dSettings::default();
        let plan = layer_plan(&settings);
        let front = plan.last().copied().unwrap();
        let back = plan[0];
        assert_eq!(front.top, settings.highlight);
        assert_eq!(front.bottom, settings.color);
        assert_eq!(back.top, settings.color);
        assert_eq!(back.bottom, settings.shadow);
    }

    #[test]
    fn three_layers_interpolate_midway() {
        let settings = Wave3dSettings {
            layers: 3,
            color: Rgb::new(100, 100, 100),
            highlight: Rgb::new(200, 200, 200),
            shadow: Rgb::new(0, 0, 0),
            ..Wave3dSettings::default()
        };
        let middle = layer_plan(&settings)[1];
        assert_eq!(middle.index, 1);
        assert_eq!(middle.top, Rgb::new(150, 150, 150));
        assert_eq!(middle.bottom, Rgb::new(50, 50, 50));
    }

    #[test]
    fn front_ridge_fills_below_the_wave() {
        let mut surface = Surface::new();
        surface.ensure(Some(&Viewport::new(320, 1.0)), 300);
        let settings = Wave3dSettings::default();
        draw(&mut surface, &[128u8; 1024], &settings);

        // the front layer sits highest and paints last; far below its ridge
        // the gradient has reached its bottom stop
        assert_eq!(surface.canvas().pixel(160, 295), Some(settings.color));
        assert_eq!(surface.canvas().pixel(160, 20), None);
        // right of the shifted front layer only the back layers show
        assert_ne!(surface.canvas().pixel(300, 295), Some(settings.color));
    }

    #[test]
    fn empty_buffer_draws_nothing() {
        let mut surface = Surface::new();
        surface.ensure(Some(&Viewport::new(320, 1.0)), 300);
        draw(&mut surface, &[], &Wave3dSettings::default());
        assert!(surface.canvas().pixels().chunks_exact(4).all(|p| p[3] == 0));
    }
}
