//! Segmented ("LED") spectrum bars with exponential smoothing and a
//! peak-hold marker per column.

use super::bars::bar_width;
use super::SpectrumSettings;
use crate::render::color::Rgb;
use crate::render::surface::Surface;

/// Weight of the previous frame's height in the smoothed height.
pub const SMOOTHING: f32 = 0.6;
/// Frames a peak marker stays put after being pushed up.
pub const PEAK_HOLD_FRAMES: u32 = 10;
/// Pixels per frame a released peak marker falls.
pub const PEAK_FALL: f32 = 1.0;

const SEGMENT_HEIGHT: f32 = 4.0;
const SEGMENT_GAP: f32 = 2.0;
const FLOOR_INSET: f32 = 4.0;
const HEADROOM: f32 = 8.0;
const PEAK_MARKER_HEIGHT: f32 = 2.0;
const PEAK_COLOR: Rgb = Rgb::new(255, 255, 255);

/// Inter-frame state, one slot per column bucket.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpectrumState {
    smoothed: Vec<f32>,
    peak_y: Vec<f32>,
    hold: Vec<u32>,
}

/// Result of advancing one column by a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnFrame {
    pub smoothed: f32,
    pub peak_y: f32,
}

impl SpectrumState {
    pub fn columns(&self) -> usize {
        self.smoothed.len()
    }

    pub fn smoothed_heights(&self) -> &[f32] {
        &self.smoothed
    }

    pub fn peak_positions(&self) -> &[f32] {
        &self.peak_y
    }

    pub fn hold_counters(&self) -> &[u32] {
        &self.hold
    }

    /// Discard and zero-fill all arrays unless they already hold exactly
    /// `columns` slots. Returns whether a reallocation happened.
    pub fn ensure_columns(&mut self, columns: usize) -> bool {
        let consistent = self.smoothed.len() == columns
            && self.peak_y.len() == columns
            && self.hold.len() == columns;
        if consistent {
            return false;
        }
        self.smoothed = vec![0.0; columns];
        self.peak_y = vec![0.0; columns];
        self.hold = vec![0; columns];
        true
    }

    /// Smooth column `column` toward `target` (pixels) and step its peak
    /// marker. Peak positions are y coordinates, so smaller is higher; a
    /// position of exactly 0 means "never set".
    pub fn advance(&mut self, column: usize, target: f32, height: f32) -> ColumnFrame {
        let smoothed = self.smoothed[column] * SMOOTHING + target * (1.0 - SMOOTHING);
        self.smoothed[column] = smoothed;

        let current_y = height - smoothed;
        let peak_y = self.peak_y[column];
        if current_y < peak_y || peak_y == 0.0 {
            self.peak_y[column] = current_y;
            self.hold[column] = PEAK_HOLD_FRAMES;
        } else if self.hold[column] > 0 {
            self.hold[column] -= 1;
        } else {
            self.peak_y[column] = (peak_y + PEAK_FALL).min(height - FLOOR_INSET);
        }

        ColumnFrame {
            smoothed,
            peak_y: self.peak_y[column],
        }
    }
}

pub fn draw(surface: &mut Surface, magnitudes: &[u8], settings: &SpectrumSettings) {
    let metrics = surface.metrics();
    if metrics.width == 0 {
        return;
    }
    let width = metrics.width as f32;
    let height = metrics.height as f32;
    let stride = bar_width(metrics.width, settings.columns);
    let columns = (metrics.width / stride) as usize;
    let max_drawable = height - HEADROOM;
    let bar_w = stride as f32 - 1.0;

    let (canvas, state) = surface.canvas_and_spectrum();
    if state.ensure_columns(columns) {
        log::debug!("Spectrum state reset for {} columns", columns);
    }

    canvas.fill_rect(0.0, 0.0, width, height, settings.backdrop);

    for c in 0..columns {
        let x = (c as u32 * stride) as f32;
        let idx = ((x / width) * magnitudes.len() as f32) as usize;
        let raw = magnitudes.get(idx).copied().unwrap_or(0);
        let magnitude = (raw as f32 / 255.0 * settings.sensitivity).clamp(0.0, 1.0);

        let column = state.advance(c, magnitude * max_drawable, height);

        let segments = (column.smoothed / (SEGMENT_HEIGHT + SEGMENT_GAP)).floor() as u32;
        for s in 0..segments {
            let top = height - FLOOR_INSET - (s + 1) as f32 * (SEGMENT_HEIGHT + SEGMENT_GAP)
                + SEGMENT_GAP;
            canvas.fill_rect(x, top, bar_w, SEGMENT_HEIGHT, settings.color);
        }

        let marker_y = column.peak_y.min(height - FLOOR_INSET).max(FLOOR_INSET);
        canvas.fill_rect(x, marker_y, bar_w, PEAK_MARKER_HEIGHT, PEAK_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::surface::Viewport;

    const HEIGHT: f32 = 300.0;

    fn spiked_state(spike: f32) -> (SpectrumState, f32) {
        let mut state = SpectrumState::default();
        state.ensure_columns(1);
        let frame = state.advance(0, spike, HEIGHT);
        (state, frame.peak_y)
    }

    #[test]
    fn peak_holds_then_falls_at_fixed_rate() {
        let (mut state, spike_y) = spiked_state(200.0);
        assert_eq!(spike_y, HEIGHT - 200.0 * (1.0 - SMOOTHING));

        for tick in 0..PEAK_HOLD_FRAMES {
            let frame = state.advance(0, 0.0, HEIGHT);
            assert_eq!(frame.peak_y, spike_y, "moved during hold at tick {}", tick);
        }
        for step in 1..=5 {
            let frame = state.advance(0, 0.0, HEIGHT);
            assert_eq!(frame.peak_y, spike_y + step as f32 * PEAK_FALL);
        }
    }

    #[test]
    fn higher_bar_resets_hold_immediately() {
        let (mut state, _) = spiked_state(50.0);
        for _ in 0..3 {
            state.advance(0, 0.0, HEIGHT);
        }
        let frame = state.advance(0, 280.0, HEIGHT);
        assert!(frame.peak_y < HEIGHT - 50.0 * (1.0 - SMOOTHING));
        assert_eq!(state.hold_counters()[0], PEAK_HOLD_FRAMES);
    }

    #[test]
    fn falling_peak_stops_at_floor() {
        let (mut state, _) = spiked_state(20.0);
        for _ in 0..200 {
            state.advance(0, 0.0, HEIGHT);
        }
        assert_eq!(state.peak_positions()[0], HEIGHT - FLOOR_INSET);
    }

    #[test]
    fn smoothing_converges_without_overshoot() {
        let mut state = SpectrumState::default();
        state.ensure_columns(1);
        let target = 180.0;
        let mut gap = target;
        for _ in 0..40 {
            let frame = state.advance(0, target, HEIGHT);
            assert!(frame.smoothed <= target + 1e-3);
            let next_gap = target - frame.smoothed;
            assert!((next_gap - gap * SMOOTHING).abs() < 1e-3);
            gap = next_gap;
        }
        assert!(gap < 1e-3);
    }

    #[test]
    fn column_count_change_discards_state() {
        let mut state = SpectrumState::default();
        assert!(state.ensure_columns(4));
        state.advance(2, 100.0, HEIGHT);
        assert!(!state.ensure_columns(4));
        assert!(state.smoothed_heights()[2] > 0.0);

        assert!(state.ensure_columns(6));
        assert_eq!(state.columns(), 6);
        assert!(state.smoothed_heights().iter().all(|&h| h == 0.0));
        assert!(state.peak_positions().iter().all(|&p| p == 0.0));
        assert!(state.hold_counters().iter().all(|&h| h == 0));
    }

    #[test]
    fn draw_sizes_state_to_columns() {
        let mut surface = Surface::new();
        surface.ensure(Some(&Viewport::new(640, 1.0)), 300);
        let settings = SpectrumSettings::default();
        draw(&mut surface, &[255u8; 1024], &settings);
        assert_eq!(surface.spectrum_state().columns(), 640 / 5);

        let wider = SpectrumSettings {
            columns: 320,
            ..settings.clone()
        };
        draw(&mut surface, &[255u8; 1024], &wider);
        assert_eq!(surface.spectrum_state().columns(), 320);
        let first = surface.spectrum_state().smoothed_heights()[0];
        assert!((first - (300.0 - HEADROOM) * (1.0 - SMOOTHING)).abs() < 1e-3);
    }

    #[test]
    fn empty_spectrum_still_paints_backdrop() {
        let mut surface = Surface::new();
        surface.ensure(Some(&Viewport::new(320, 1.0)), 100);
        let settings = SpectrumSettings::default();
        draw(&mut surface, &[], &settings);
        assert_eq!(surface.canvas().pixel(10, 10), Some(settings.backdrop));
    }
}
