//! Frame compositor: maps the active styles onto surfaces and draws them.
//!
//! In overlay layout every active style is drawn, in canonical order, onto a
//! single surface whose bottom strip is reserved for the playback progress
//! bar. In split layout each active style owns a surface of its own and
//! there is no progress bar.

use crate::frame::{PlaybackProgress, SampleFrame};
use crate::render::color::Rgb;
use crate::render::surface::{SplitSurfaces, Surface, Viewport};
use crate::state::{LayoutMode, VisualConfig};
use crate::styles::{bars, circular, line, rms, spectrum, wave3d, StyleId, StyleSettings};

pub const DEFAULT_HEIGHT: u32 = 300;
pub const DEFAULT_PREVIEW_HEIGHT: u32 = 200;
pub const DEFAULT_BACKGROUND: Rgb = Rgb::new(0x0b, 0x10, 0x20);

/// Height of the strip at the bottom of the overlay reserved for progress.
pub const PROGRESS_STRIP: f32 = 10.0;
const GUIDE_COLOR: Rgb = Rgb::new(0x22, 0x2b, 0x4a);
const PROGRESS_COLOR: Rgb = Rgb::new(0xff, 0xcc, 0x00);
const PREVIEW_COLOR: Rgb = Rgb::new(0x5a, 0xc8, 0xfa);
const PREVIEW_MARGIN: f32 = 6.0;

/// What one call to [`Compositor::render`] did.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderReport {
    pub layout: LayoutMode,
    /// Styles drawn this tick, in draw order.
    pub drawn: Vec<StyleId>,
    /// Styles that were active but had no surface to draw on.
    pub skipped: Vec<StyleId>,
    /// Progress shown in the overlay strip, if any.
    pub progress: Option<f32>,
}

#[derive(Debug)]
pub struct Compositor {
    overlay: Option<Surface>,
    split: SplitSurfaces,
    height: u32,
    preview_height: u32,
    background: Rgb,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(DEFAULT_HEIGHT, DEFAULT_PREVIEW_HEIGHT, DEFAULT_BACKGROUND)
    }
}

impl Compositor {
    pub fn new(height: u32, preview_height: u32, background: Rgb) -> Self {
        Self {
            overlay: None,
            split: SplitSurfaces::default(),
            height,
            preview_height,
            background,
        }
    }

    pub fn overlay_surface(&self) -> Option<&Surface> {
        self.overlay.as_ref()
    }

    pub fn split_surfaces(&self) -> &SplitSurfaces {
        &self.split
    }

    /// Drop every surface, and with them all inter-frame state.
    pub fn release(&mut self) {
        if self.overlay.take().is_some() || !self.split.is_empty() {
            log::debug!("Releasing compositor surfaces");
        }
        self.split.clear();
    }

    /// Draw one frame for the current configuration.
    ///
    /// `container` is the host element the surfaces are mounted in; while it
    /// is `None` nothing is drawn and the active styles are reported as
    /// skipped. Surface bookkeeping still follows the configuration so a
    /// deactivated style loses its surface on the next tick either way.
    pub fn render(
        &mut self,
        frame: &SampleFrame,
        config: &VisualConfig,
        progress: Option<PlaybackProgress>,
        container: Option<&Viewport>,
    ) -> RenderReport {
        self.sync_layout(config);

        let Some(container) = container else {
            log::debug!("No container attached; skipping tick");
            return RenderReport {
                layout: config.layout,
                drawn: Vec::new(),
                skipped: config.selected.iter().collect(),
                progress: None,
            };
        };

        match config.layout {
            LayoutMode::Overlay => self.render_overlay(frame, config, progress, container),
            LayoutMode::Split => self.render_split(frame, config, container),
        }
    }

    /// Draw the static waveform preview shown before playback starts.
    ///
    /// Only the overlay layout has a preview; returns whether anything was
    /// drawn.
    pub fn render_preview(
        &mut self,
        peaks: &[f32],
        progress: Option<PlaybackProgress>,
        layout: LayoutMode,
        container: Option<&Viewport>,
    ) -> bool {
        if layout != LayoutMode::Overlay {
            return false;
        }
        let Some(container) = container else {
            return false;
        };
        let background = self.background;
        let surface = self.overlay.get_or_insert_with(Surface::new);
        let metrics = surface.ensure(Some(container), self.preview_height);
        let width = metrics.width as f32;
        let height = metrics.height as f32;
        let canvas = surface.canvas_mut();

        canvas.fill_rect(0.0, 0.0, width, height, background);
        canvas.fill_rect(0.0, (height / 2.0).floor(), width, 1.0, GUIDE_COLOR);
        if peaks.is_empty() {
            return true;
        }

        let bar_width = (metrics.width / peaks.len() as u32).max(1) as f32;
        let half = (height - PROGRESS_STRIP) / 2.0;
        for (i, &amp) in peaks.iter().enumerate() {
            let x = i as f32 * bar_width;
            if x >= width {
                break;
            }
            let bar = amp * (half - PREVIEW_MARGIN);
            canvas.fill_rect(x, half - bar, (bar_width - 1.0).max(1.0), bar * 2.0, PREVIEW_COLOR);
        }

        if let Some(progress) = progress {
            draw_progress_strip(surface, progress, background);
        }
        true
    }

    fn sync_layout(&mut self, config: &VisualConfig) {
        match config.layout {
            LayoutMode::Overlay => {
                if !self.split.is_empty() {
                    log::debug!("Overlay layout: releasing {} split surfaces", self.split.len());
                    self.split.clear();
                }
            }
            LayoutMode::Split => {
                if self.overlay.take().is_some() {
                    log::debug!("Split layout: releasing overlay surface");
                }
                self.split.reconcile(config.selected.as_set());
            }
        }
    }

    fn render_overlay(
        &mut self,
        frame: &SampleFrame,
        config: &VisualConfig,
        progress: Option<PlaybackProgress>,
        container: &Viewport,
    ) -> RenderReport {
        let background = self.background;
        let surface = self.overlay.get_or_insert_with(Surface::new);
        let metrics = surface.ensure(Some(container), self.height);
        let width = metrics.width as f32;
        let height = metrics.height as f32;

        let canvas = surface.canvas_mut();
        canvas.fill_rect(0.0, 0.0, width, height, background);
        canvas.fill_rect(0.0, (height / 2.0).floor(), width, 1.0, GUIDE_COLOR);
        canvas.save();
        canvas.clip_rect(0.0, 0.0, width, height - PROGRESS_STRIP);

        let mut drawn = Vec::with_capacity(config.selected.len());
        for id in config.selected.iter() {
            draw_style(surface, frame, config.styles.get(id));
            drawn.push(id);
        }
        surface.canvas_mut().restore();

        if let Some(progress) = progress {
            draw_progress_strip(surface, progress, background);
        }

        RenderReport {
            layout: LayoutMode::Overlay,
            drawn,
            skipped: Vec::new(),
            progress: progress.map(PlaybackProgress::fraction),
        }
    }

    fn render_split(
        &mut self,
        frame: &SampleFrame,
        config: &VisualConfig,
        container: &Viewport,
    ) -> RenderReport {
        let background = self.background;
        let mut drawn = Vec::with_capacity(self.split.len());
        for (id, surface) in self.split.iter_mut() {
            let metrics = surface.ensure(Some(container), self.height);
            surface.canvas_mut().fill_rect(
                0.0,
                0.0,
                metrics.width as f32,
                metrics.height as f32,
                background,
            );
            draw_style(surface, frame, config.styles.get(id));
            drawn.push(id);
        }

        RenderReport {
            layout: LayoutMode::Split,
            drawn,
            skipped: Vec::new(),
            progress: None,
        }
    }
}

fn draw_style(surface: &mut Surface, frame: &SampleFrame, settings: &StyleSettings) {
    let buffer = if settings.style().uses_spectrum() {
        frame.freq_domain.as_slice()
    } else {
        frame.time_domain.as_slice()
    };
    match settings {
        StyleSettings::Line(s) => line::draw(surface, buffer, s),
        StyleSettings::Bars(s) => bars::draw(surface, buffer, s),
        StyleSettings::Spectrum(s) => spectrum::draw(surface, buffer, s),
        StyleSettings::Circular(s) => circular::draw(surface, buffer, s),
        StyleSettings::Mirrored(s) => bars::draw_mirrored(surface, buffer, s),
        StyleSettings::Rms(s) => rms::draw(surface, buffer, s),
        StyleSettings::Wave3d(s) => wave3d::draw(surface, buffer, s),
    }
}

fn draw_progress_strip(surface: &mut Surface, progress: PlaybackProgress, background: Rgb) {
    let metrics = surface.metrics();
    let width = metrics.width as f32;
    let top = metrics.height as f32 - PROGRESS_STRIP;
    let filled = (progress.fraction() * width).floor();

    let canvas = surface.canvas_mut();
    canvas.fill_rect(0.0, top, width, PROGRESS_STRIP, background);
    canvas.fill_rect(0.0, top - 1.0, width, 1.0, GUIDE_COLOR);
    canvas.fill_rect(0.0, top + 2.0, filled, PROGRESS_STRIP - 4.0, PROGRESS_COLOR);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::styles::SelectedStyles;
    use serde_json::json;

    fn viewport() -> Viewport {
        Viewport::new(640, 1.0)
    }

    fn loud_frame() -> SampleFrame {
        let time: Vec<u8> = (0..2048).map(|i| if i % 2 == 0 { 0 } else { 255 }).collect();
        SampleFrame::new(time, vec![255; 1024])
    }

    fn config_with(styles: &[StyleId], layout: LayoutMode) -> VisualConfig {
        VisualConfig {
            selected: styles.iter().copied().collect::<SelectedStyles>(),
            layout,
            ..VisualConfig::default()
        }
    }

    fn spectrum_columns(compositor: &Compositor, id: StyleId) -> usize {
        compositor
            .split_surfaces()
            .get(id)
            .map(|s| s.spectrum_state().columns())
            .unwrap_or(0)
    }

    #[test]
    fn overlay_draws_in_canonical_order() {
        let mut compositor = Compositor::default();
        let config = config_with(&[StyleId::Wave3d, StyleId::Rms, StyleId::Line], LayoutMode::Overlay);
        let report = compositor.render(&SampleFrame::silent(2048), &config, None, Some(&viewport()));
        assert_eq!(report.drawn, vec![StyleId::Line, StyleId::Rms, StyleId::Wave3d]);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn overlay_styles_never_bleed_into_the_progress_strip() {
        let mut compositor = Compositor::default();
        let config = config_with(&[StyleId::Bars], LayoutMode::Overlay);
        compositor.render(&loud_frame(), &config, None, Some(&viewport()));

        // full-scale bars span y = 6..294; the strip starts at 290
        let bars = crate::styles::BarsSettings::default().color;
        let canvas = compositor.overlay_surface().unwrap().canvas();
        assert_eq!(canvas.pixel(0, 285), Some(bars));
        for y in 290..300 {
            assert_eq!(canvas.pixel(0, y), Some(DEFAULT_BACKGROUND));
        }
    }

    #[test]
    fn progress_strip_fills_from_the_left() {
        let mut compositor = Compositor::default();
        let config = config_with(&[StyleId::Line], LayoutMode::Overlay);
        let progress = PlaybackProgress::from_times(30.0, 120.0);
        let report = compositor.render(&SampleFrame::silent(2048), &config, progress, Some(&viewport()));
        assert_eq!(report.progress, Some(0.25));

        let canvas = compositor.overlay_surface().unwrap().canvas();
        assert_eq!(canvas.pixel(0, 295), Some(PROGRESS_COLOR));
        assert_eq!(canvas.pixel(159, 295), Some(PROGRESS_COLOR));
        assert_eq!(canvas.pixel(160, 295), Some(DEFAULT_BACKGROUND));
        assert_eq!(canvas.pixel(400, 289), Some(GUIDE_COLOR));
    }

    #[test]
    fn unknown_duration_draws_no_progress() {
        let mut compositor = Compositor::default();
        let config = config_with(&[StyleId::Line], LayoutMode::Overlay);
        let progress = PlaybackProgress::from_times(3.0, 0.0);
        let report = compositor.render(&SampleFrame::silent(2048), &config, progress, Some(&viewport()));
        assert_eq!(report.progress, None);
        let canvas = compositor.overlay_surface().unwrap().canvas();
        assert_eq!(canvas.pixel(0, 295), Some(DEFAULT_BACKGROUND));
    }

    #[test]
    fn missing_container_skips_the_tick() {
        let mut compositor = Compositor::default();
        let config = config_with(&[StyleId::Line, StyleId::Bars], LayoutMode::Split);
        let report = compositor.render(&SampleFrame::silent(2048), &config, None, None);
        assert!(report.drawn.is_empty());
        assert_eq!(report.skipped, vec![StyleId::Line, StyleId::Bars]);

        let report = compositor.render(&SampleFrame::silent(2048), &config, None, Some(&viewport()));
        assert_eq!(report.drawn, vec![StyleId::Line, StyleId::Bars]);
    }

    #[test]
    fn split_gives_each_style_its_own_surface() {
        let mut compositor = Compositor::default();
        let mut config = config_with(&[StyleId::Bars, StyleId::Circular], LayoutMode::Split);
        let report = compositor.render(&loud_frame(), &config, PlaybackProgress::from_times(1.0, 2.0), Some(&viewport()));
        assert_eq!(report.drawn, vec![StyleId::Bars, StyleId::Circular]);
        assert_eq!(report.progress, None);
        assert!(compositor.overlay_surface().is_none());
        assert_eq!(compositor.split_surfaces().len(), 2);

        config.toggle_style(StyleId::Bars);
        compositor.render(&loud_frame(), &config, None, Some(&viewport()));
        let ids: Vec<StyleId> = compositor.split_surfaces().ids().collect();
        assert_eq!(ids, vec![StyleId::Circular]);
    }

    #[test]
    fn layout_switch_releases_the_other_layout() {
        let mut compositor = Compositor::default();
        let mut config = config_with(&[StyleId::Line], LayoutMode::Overlay);
        compositor.render(&SampleFrame::silent(2048), &config, None, Some(&viewport()));
        assert!(compositor.overlay_surface().is_some());

        config.set_layout_mode(LayoutMode::Split);
        compositor.render(&SampleFrame::silent(2048), &config, None, Some(&viewport()));
        assert!(compositor.overlay_surface().is_none());
        assert_eq!(compositor.split_surfaces().len(), 1);

        config.set_layout_mode(LayoutMode::Overlay);
        compositor.render(&SampleFrame::silent(2048), &config, None, Some(&viewport()));
        assert!(compositor.split_surfaces().is_empty());
    }

    #[test]
    fn split_toggle_with_tick_between_resets_spectrum_state() {
        let mut compositor = Compositor::default();
        let mut config = config_with(&[StyleId::Spectrum], LayoutMode::Split);
        compositor.render(&loud_frame(), &config, None, Some(&viewport()));
        assert!(spectrum_columns(&compositor, StyleId::Spectrum) > 0);

        config.toggle_style(StyleId::Spectrum);
        compositor.render(&loud_frame(), &config, None, Some(&viewport()));
        assert!(compositor.split_surfaces().get(StyleId::Spectrum).is_none());

        config.toggle_style(StyleId::Spectrum);
        compositor.render(&SampleFrame::new(vec![128; 2048], vec![0; 1024]), &config, None, Some(&viewport()));
        let state = compositor
            .split_surfaces()
            .get(StyleId::Spectrum)
            .unwrap()
            .spectrum_state();
        assert!(state.smoothed_heights().iter().all(|&h| h == 0.0));
    }

    #[test]
    fn split_toggle_without_tick_between_keeps_spectrum_state() {
        let mut compositor = Compositor::default();
        let mut config = config_with(&[StyleId::Spectrum], LayoutMode::Split);
        compositor.render(&loud_frame(), &config, None, Some(&viewport()));

        config.toggle_style(StyleId::Spectrum);
        config.toggle_style(StyleId::Spectrum);
        compositor.render(&SampleFrame::new(vec![128; 2048], vec![0; 1024]), &config, None, Some(&viewport()));
        let state = compositor
            .split_surfaces()
            .get(StyleId::Spectrum)
            .unwrap()
            .spectrum_state();
        assert!(state.smoothed_heights().iter().all(|&h| h > 0.0));
    }

    #[test]
    fn overlay_keeps_spectrum_state_across_toggles() {
        let mut compositor = Compositor::default();
        let mut config = config_with(&[StyleId::Spectrum], LayoutMode::Overlay);
        compositor.render(&loud_frame(), &config, None, Some(&viewport()));

        config.toggle_style(StyleId::Spectrum);
        compositor.render(&loud_frame(), &config, None, Some(&viewport()));
        config.toggle_style(StyleId::Spectrum);
        compositor.render(&SampleFrame::new(vec![128; 2048], vec![0; 1024]), &config, None, Some(&viewport()));

        let state = compositor.overlay_surface().unwrap().spectrum_state();
        assert!(state.smoothed_heights().iter().all(|&h| h > 0.0));
    }

    #[test]
    fn settings_changes_apply_on_the_next_tick() {
        let mut compositor = Compositor::default();
        let mut config = config_with(&[StyleId::Spectrum], LayoutMode::Split);
        compositor.render(&loud_frame(), &config, None, Some(&viewport()));
        assert_eq!(spectrum_columns(&compositor, StyleId::Spectrum), 128);

        config
            .update_style_setting(StyleId::Spectrum, "columns", json!(320))
            .unwrap();
        compositor.render(&loud_frame(), &config, None, Some(&viewport()));
        assert_eq!(spectrum_columns(&compositor, StyleId::Spectrum), 320);
    }

    #[test]
    fn preview_draws_one_bar_per_peak() {
        let mut compositor = Compositor::default();
        let peaks = vec![1.0, 0.0, 0.5, 1.0];
        assert!(compositor.render_preview(&peaks, None, LayoutMode::Overlay, Some(&viewport())));

        let surface = compositor.overlay_surface().unwrap();
        assert_eq!(surface.metrics().height, DEFAULT_PREVIEW_HEIGHT);
        let canvas = surface.canvas();
        // 640 / 4 = 160px per bar, half height (200 - 10) / 2 = 95
        assert_eq!(canvas.pixel(10, 20), Some(PREVIEW_COLOR));
        assert_eq!(canvas.pixel(170, 20), Some(DEFAULT_BACKGROUND));
        assert_eq!(canvas.pixel(159, 95), Some(DEFAULT_BACKGROUND));
    }

    #[test]
    fn preview_is_overlay_only() {
        let mut compositor = Compositor::default();
        assert!(!compositor.render_preview(&[1.0], None, LayoutMode::Split, Some(&viewport())));
        assert!(compositor.overlay_surface().is_none());
    }

    #[test]
    fn release_drops_all_state() {
        let mut compositor = Compositor::default();
        let config = config_with(&[StyleId::Spectrum], LayoutMode::Split);
        compositor.render(&loud_frame(), &config, None, Some(&viewport()));
        compositor.release();
        assert!(compositor.split_surfaces().is_empty());
        assert!(compositor.overlay_surface().is_none());
    }
}
