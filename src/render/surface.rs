use std::collections::{BTreeMap, BTreeSet};

use super::canvas::Canvas;
use crate::styles::spectrum::SpectrumState;
use crate::styles::StyleId;

/// Logical widths below this are raised to it.
pub const MIN_SURFACE_WIDTH: u32 = 320;
/// Logical width used when no container is attached.
pub const FALLBACK_SURFACE_WIDTH: u32 = 640;
/// Device scales above this are clamped to it.
pub const MAX_DEVICE_SCALE: f32 = 8.0;

/// Metrics of the host container a surface is mounted in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Container width in logical pixels; 0 when not laid out yet, which
    /// the width floor then raises.
    pub width: u32,
    /// Physical pixels per logical pixel.
    pub device_scale: f32,
}

impl Viewport {
    pub fn new(width: u32, device_scale: f32) -> Self {
        Self {
            width,
            device_scale,
        }
    }
}

/// Logical size of a surface after [`Surface::ensure`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceMetrics {
    pub width: u32,
    pub height: u32,
    pub device_scale: f32,
}

/// A raster target plus the inter-frame state of whatever is drawn on it.
#[derive(Debug)]
pub struct Surface {
    canvas: Canvas,
    metrics: SurfaceMetrics,
    allocations: usize,
    spectrum: SpectrumState,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    /// An unallocated surface; the backing buffer is created on first `ensure`.
    pub fn new() -> Self {
        Self {
            canvas: Canvas::new(0, 0),
            metrics: SurfaceMetrics {
                width: 0,
                height: 0,
                device_scale: 1.0,
            },
            allocations: 0,
            spectrum: SpectrumState::default(),
        }
    }

    /// Size the surface for the container and return its logical metrics.
    ///
    /// The backing buffer is reallocated only when `logical size x scale`
    /// differs from the current allocation. The transform is always reset to
    /// exactly the device scale, so callers draw in logical pixels.
    pub fn ensure(&mut self, viewport: Option<&Viewport>, height: u32) -> SurfaceMetrics {
        let container_width = viewport.map_or(FALLBACK_SURFACE_WIDTH, |v| v.width);
        let width = container_width.max(MIN_SURFACE_WIDTH);
        let scale = viewport
            .map(|v| v.device_scale)
            .filter(|s| s.is_finite() && *s > 0.0)
            .map_or(1.0, |s| s.min(MAX_DEVICE_SCALE));

        let px_width = (width as f32 * scale) as u32;
        let px_height = (height as f32 * scale) as u32;
        if self.allocations == 0
            || px_width != self.canvas.width()
            || px_height != self.canvas.height()
        {
            log::debug!(
                "Allocating surface {}x{} (logical {}x{} @ {:.2})",
                px_width,
                px_height,
                width,
                height,
                scale
            );
            self.canvas = Canvas::new(px_width, px_height);
            self.allocations += 1;
        }

        self.canvas.reset_transform();
        self.canvas.scale(scale);
        self.metrics = SurfaceMetrics {
            width,
            height,
            device_scale: scale,
        };
        self.metrics
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn metrics(&self) -> SurfaceMetrics {
        self.metrics
    }

    /// Number of times the backing buffer has been (re)allocated.
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    pub fn spectrum_state(&self) -> &SpectrumState {
        &self.spectrum
    }

    pub(crate) fn canvas_and_spectrum(&mut self) -> (&mut Canvas, &mut SpectrumState) {
        (&mut self.canvas, &mut self.spectrum)
    }
}

/// Surfaces owned per active style in split layout.
#[derive(Debug, Default)]
pub struct SplitSurfaces {
    surfaces: BTreeMap<StyleId, Surface>,
}

/// What a reconciliation pass changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reconciled {
    pub created: Vec<StyleId>,
    pub removed: Vec<StyleId>,
}

impl SplitSurfaces {
    /// Create surfaces for newly active styles and discard surfaces of styles
    /// no longer active. Repeated calls with the same set change nothing.
    pub fn reconcile(&mut self, active: &BTreeSet<StyleId>) -> Reconciled {
        let removed: Vec<StyleId> = self
            .surfaces
            .keys()
            .filter(|id| !active.contains(id))
            .copied()
            .collect();
        for id in &removed {
            self.surfaces.remove(id);
        }

        let mut created = Vec::new();
        for &id in active {
            if !self.surfaces.contains_key(&id) {
                self.surfaces.insert(id, Surface::new());
                created.push(id);
            }
        }

        if !created.is_empty() || !removed.is_empty() {
            log::debug!("Split surfaces: created {:?}, removed {:?}", created, removed);
        }
        Reconciled { created, removed }
    }

    pub fn get(&self, id: StyleId) -> Option<&Surface> {
        self.surfaces.get(&id)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (StyleId, &mut Surface)> {
        self.surfaces.iter_mut().map(|(id, s)| (*id, s))
    }

    pub fn ids(&self) -> impl Iterator<Item = StyleId> + '_ {
        self.surfaces.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn clear(&mut self) {
        self.surfaces.clear();
    }
}
