use std::fmt;

use tiny_skia::{
    FillRule, GradientStop, LineCap, LineJoin, LinearGradient, Mask, PathBuilder, Pixmap, Point,
    Rect, Shader, SpreadMode, Stroke, Transform,
};

use super::color::Rgb;

/// How a filled shape is colored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Paint {
    Solid(Rgb),
    /// Vertical linear gradient between two logical y positions. Rows above
    /// `y0` take `from`, rows below `y1` take `to`.
    VerticalGradient { y0: f32, y1: f32, from: Rgb, to: Rgb },
}

impl Paint {
    fn shader(&self) -> Shader<'static> {
        match *self {
            Paint::Solid(color) => Shader::SolidColor(sk_color(color)),
            Paint::VerticalGradient { y0, y1, from, to } => {
                if (y1 - y0).abs() <= f32::EPSILON {
                    return Shader::SolidColor(sk_color(from));
                }
                LinearGradient::new(
                    Point::from_xy(0.0, y0),
                    Point::from_xy(0.0, y1),
                    vec![
                        GradientStop::new(0.0, sk_color(from)),
                        GradientStop::new(1.0, sk_color(to)),
                    ],
                    SpreadMode::Pad,
                    Transform::identity(),
                )
                .unwrap_or(Shader::SolidColor(sk_color(from)))
            }
        }
    }
}

fn sk_color(color: Rgb) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, 255)
}

/// Aliased opaque paint: every covered pixel takes the exact color.
fn sk_paint(shader: Shader<'static>) -> tiny_skia::Paint<'static> {
    tiny_skia::Paint {
        shader,
        anti_alias: false,
        ..tiny_skia::Paint::default()
    }
}

fn finite(points: &[(f32, f32)]) -> bool {
    points.iter().all(|(x, y)| x.is_finite() && y.is_finite())
}

/// Logical rectangle with min/max normalised, so negative extents work.
fn logical_rect(x: f32, y: f32, w: f32, h: f32) -> Option<Rect> {
    Rect::from_ltrb(x.min(x + w), y.min(y + h), x.max(x + w), y.max(y + h))
}

/// RGBA raster with a 2D-canvas style drawing API, backed by a
/// `tiny_skia::Pixmap`.
///
/// Drawing coordinates are logical pixels; a uniform scale maps them onto the
/// backing buffer. Shapes are rasterised without anti-aliasing and every
/// write is fully opaque. A zero-sized canvas has no pixmap and ignores all
/// drawing.
#[derive(Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixmap: Option<Pixmap>,
    scale: f32,
    clip: Option<Mask>,
    saved: Vec<(f32, Option<Mask>)>,
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("scale", &self.scale)
            .field("clipped", &self.clip.is_some())
            .field("saved", &self.saved.len())
            .finish()
    }
}

impl Canvas {
    /// Allocate a transparent canvas of `width` x `height` device pixels.
    pub fn new(width: u32, height: u32) -> Self {
        let pixmap = Pixmap::new(width, height);
        if pixmap.is_none() && width > 0 && height > 0 {
            log::warn!("Cannot allocate a {}x{} canvas", width, height);
        }
        Self {
            width,
            height,
            pixmap,
            scale: 1.0,
            clip: None,
            saved: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major RGBA bytes. Every painted pixel is opaque, so the
    /// premultiplied storage equals straight RGBA.
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.as_ref().map_or(&[], |p| p.data())
    }

    /// Color of the device pixel at (x, y), or `None` outside the buffer or
    /// where nothing has been painted yet.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        let px = self.pixmap.as_ref()?.pixel(x, y)?;
        if px.alpha() == 0 {
            return None;
        }
        let c = px.demultiply();
        Some(Rgb::new(c.red(), c.green(), c.blue()))
    }

    pub fn current_scale(&self) -> f32 {
        self.scale
    }

    pub fn reset_transform(&mut self) {
        self.scale = 1.0;
    }

    /// Multiply the current transform by a uniform scale.
    pub fn scale(&mut self, factor: f32) {
        self.scale *= factor;
    }

    pub fn save(&mut self) {
        self.saved.push((self.scale, self.clip.clone()));
    }

    pub fn restore(&mut self) {
        if let Some((scale, clip)) = self.saved.pop() {
            self.scale = scale;
            self.clip = clip;
        }
    }

    /// Intersect the clip region with a logical rectangle.
    pub fn clip_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let transform = self.transform();
        let Some(path) = logical_rect(x, y, w, h).map(PathBuilder::from_rect) else {
            // an unrepresentable rectangle clips everything away
            self.clip = Mask::new(self.width, self.height);
            return;
        };
        match self.clip.as_mut() {
            Some(mask) => mask.intersect_path(&path, FillRule::Winding, false, transform),
            None => {
                self.clip = Mask::new(self.width, self.height).map(|mut mask| {
                    mask.fill_path(&path, FillRule::Winding, false, transform);
                    mask
                });
            }
        }
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        let Some(rect) = logical_rect(x, y, w, h) else {
            return;
        };
        let transform = self.transform();
        let paint = sk_paint(Shader::SolidColor(sk_color(color)));
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill_rect(rect, &paint, transform, self.clip.as_ref());
        }
    }

    /// Stroke a single segment.
    pub fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Rgb) {
        self.stroke_polyline(&[from, to], width, color);
    }

    /// Stroke connected segments through `points` with round joins and caps.
    pub fn stroke_polyline(&mut self, points: &[(f32, f32)], width: f32, color: Rgb) {
        if points.len() < 2 || !finite(points) || !width.is_finite() {
            return;
        }
        let Some(path) = polyline_path(points, false) else {
            return;
        };
        let stroke = Stroke {
            width: width.max(0.0),
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        let transform = self.transform();
        let paint = sk_paint(Shader::SolidColor(sk_color(color)));
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.stroke_path(&path, &paint, &stroke, transform, self.clip.as_ref());
        }
    }

    /// Fill a closed polygon (even-odd rule).
    pub fn fill_polygon(&mut self, points: &[(f32, f32)], paint: Paint) {
        if points.len() < 3 || !finite(points) {
            return;
        }
        let Some(path) = polyline_path(points, true) else {
            return;
        };
        let transform = self.transform();
        let paint = sk_paint(paint.shader());
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill_path(&path, &paint, FillRule::EvenOdd, transform, self.clip.as_ref());
        }
    }

    fn transform(&self) -> Transform {
        Transform::from_scale(self.scale, self.scale)
    }
}

fn polyline_path(points: &[(f32, f32)], close: bool) -> Option<tiny_skia::Path> {
    let (&(x0, y0), rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(x0, y0);
    for &(x, y) in rest {
        pb.line_to(x, y);
    }
    if close {
        pb.close();
    }
    pb.finish()
}
