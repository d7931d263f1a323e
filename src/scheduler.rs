//! Frame scheduler: a self-perpetuating chain of ticks that pulls the latest
//! sample frame and hands it to the compositor.
//!
//! The host refresh callback is abstracted behind [`TickScheduler`] so the
//! loop can be driven by a display link, a timer or, in tests and offline
//! rendering, single-stepped through [`ManualScheduler`].

use std::collections::VecDeque;

use crate::compositor::{Compositor, RenderReport};
use crate::error::Result;
use crate::frame::{PlaybackProgress, SampleFrame};
use crate::render::surface::Viewport;
use crate::state::{LayoutMode, VisualConfig};
use crate::styles::StyleId;

/// Handle for one requested tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickId(u64);

/// Host refresh timing.
pub trait TickScheduler {
    /// Ask for one callback on the next refresh.
    fn request_tick(&mut self) -> TickId;
    /// Withdraw a requested callback. Unknown or already-fired ids are ignored.
    fn cancel_tick(&mut self, id: TickId);
}

/// Queue of requested ticks that fire only when popped.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    queue: VecDeque<TickId>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next tick that would fire, removing it from the queue.
    pub fn pop_due(&mut self) -> Option<TickId> {
        self.queue.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl TickScheduler for ManualScheduler {
    fn request_tick(&mut self) -> TickId {
        let id = TickId(self.next_id);
        self.next_id += 1;
        self.queue.push_back(id);
        id
    }

    fn cancel_tick(&mut self, id: TickId) {
        self.queue.retain(|queued| *queued != id);
    }
}

/// Producer of analyser frames. Only the most recent frame is ever read.
pub trait SampleSource {
    /// `None` until the source has produced its first frame.
    fn latest(&mut self) -> Option<&SampleFrame>;
}

/// Playback position of the track being visualised, in seconds.
pub trait PlaybackClock {
    fn current_time(&self) -> f64;
    /// Zero or non-finite while unknown.
    fn duration(&self) -> f64;
}

/// What happened on a tick callback.
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// The tick was cancelled or superseded; nothing ran.
    Stale,
    /// No sample frame available yet; the chain continues.
    NotReady,
    Rendered(RenderReport),
}

pub struct RenderLoop<S: TickScheduler> {
    scheduler: S,
    compositor: Compositor,
    config: VisualConfig,
    container: Option<Viewport>,
    pending: Option<TickId>,
    rendered: u64,
}

impl<S: TickScheduler> RenderLoop<S> {
    pub fn new(scheduler: S, compositor: Compositor, config: VisualConfig) -> Self {
        Self {
            scheduler,
            compositor,
            config,
            container: None,
            pending: None,
            rendered: 0,
        }
    }

    pub fn start(&mut self) {
        if self.pending.is_none() {
            self.pending = Some(self.scheduler.request_tick());
            log::debug!("Render loop started");
        }
    }

    /// Cancel the outstanding tick and drop every surface.
    pub fn stop(&mut self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.cancel_tick(id);
            log::debug!("Render loop stopped after {} frames", self.rendered);
        }
        self.compositor.release();
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of ticks that reached the compositor.
    pub fn frames_rendered(&self) -> u64 {
        self.rendered
    }

    pub fn config(&self) -> &VisualConfig {
        &self.config
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Attach, resize or detach the host container.
    pub fn set_container(&mut self, container: Option<Viewport>) {
        self.container = container;
    }

    /// Tick callback. The next tick is requested before any work is done so
    /// the chain survives a frame that has nothing to draw.
    pub fn on_tick(
        &mut self,
        id: TickId,
        source: &mut dyn SampleSource,
        clock: &dyn PlaybackClock,
    ) -> TickOutcome {
        if self.pending != Some(id) {
            return TickOutcome::Stale;
        }
        self.pending = Some(self.scheduler.request_tick());

        let Some(frame) = source.latest() else {
            return TickOutcome::NotReady;
        };
        let progress = PlaybackProgress::from_times(clock.current_time(), clock.duration());
        let report = self
            .compositor
            .render(frame, &self.config, progress, self.container.as_ref());
        self.rendered += 1;
        TickOutcome::Rendered(report)
    }

    pub fn update_style_setting(
        &mut self,
        style: StyleId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<()> {
        self.config.update_style_setting(style, key, value)?;
        self.restart();
        Ok(())
    }

    pub fn toggle_style(&mut self, style: StyleId) -> bool {
        let active = self.config.toggle_style(style);
        self.restart();
        active
    }

    pub fn set_layout_mode(&mut self, mode: LayoutMode) {
        self.config.set_layout_mode(mode);
        self.restart();
    }

    /// A configuration change tears down the running chain and starts a new
    /// one, so a tick queued under the old configuration never fires.
    fn restart(&mut self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.cancel_tick(id);
            self.pending = Some(self.scheduler.request_tick());
        }
    }
}

impl RenderLoop<ManualScheduler> {
    /// Fire the next queued tick, if any.
    pub fn step(
        &mut self,
        source: &mut dyn SampleSource,
        clock: &dyn PlaybackClock,
    ) -> Option<TickOutcome> {
        let id = self.scheduler.pop_due()?;
        Some(self.on_tick(id, source, clock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedSource(Option<SampleFrame>);

    impl SampleSource for FixedSource {
        fn latest(&mut self) -> Option<&SampleFrame> {
            self.0.as_ref()
        }
    }

    struct FixedClock {
        current: f64,
        duration: f64,
    }

    impl PlaybackClock for FixedClock {
        fn current_time(&self) -> f64 {
            self.current
        }

        fn duration(&self) -> f64 {
            self.duration
        }
    }

    fn clock() -> FixedClock {
        FixedClock {
            current: 5.0,
            duration: 10.0,
        }
    }

    fn running_loop() -> RenderLoop<ManualScheduler> {
        let mut render_loop = RenderLoop::new(
            ManualScheduler::new(),
            Compositor::default(),
            VisualConfig::default(),
        );
        render_loop.set_container(Some(Viewport::new(640, 1.0)));
        render_loop.start();
        render_loop
    }

    #[test]
    fn each_tick_requests_exactly_one_more() {
        let mut render_loop = running_loop();
        let mut source = FixedSource(Some(SampleFrame::silent(2048)));
        for _ in 0..5 {
            let outcome = render_loop.step(&mut source, &clock());
            assert!(matches!(outcome, Some(TickOutcome::Rendered(_))));
            assert_eq!(render_loop.scheduler().pending(), 1);
        }
        assert_eq!(render_loop.frames_rendered(), 5);
    }

    #[test]
    fn tick_before_source_is_ready_is_a_noop() {
        let mut render_loop = running_loop();
        let mut source = FixedSource(None);
        assert_eq!(render_loop.step(&mut source, &clock()), Some(TickOutcome::NotReady));
        assert!(render_loop.is_running());
        assert!(render_loop.compositor().overlay_surface().is_none());

        source.0 = Some(SampleFrame::silent(2048));
        match render_loop.step(&mut source, &clock()) {
            Some(TickOutcome::Rendered(report)) => {
                assert_eq!(report.drawn, vec![StyleId::Line]);
                assert_eq!(report.progress, Some(0.5));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn stop_cancels_pending_tick_and_releases_surfaces() {
        let mut render_loop = running_loop();
        let mut source = FixedSource(Some(SampleFrame::silent(2048)));
        render_loop.step(&mut source, &clock());
        assert!(render_loop.compositor().overlay_surface().is_some());

        render_loop.stop();
        assert!(!render_loop.is_running());
        assert_eq!(render_loop.scheduler().pending(), 0);
        assert!(render_loop.compositor().overlay_surface().is_none());
        assert_eq!(render_loop.step(&mut source, &clock()), None);
    }

    #[test]
    fn cancelled_tick_delivered_late_is_stale() {
        let mut render_loop = running_loop();
        let mut source = FixedSource(Some(SampleFrame::silent(2048)));
        let old = TickId(100);
        assert_eq!(render_loop.on_tick(old, &mut source, &clock()), TickOutcome::Stale);
        assert_eq!(render_loop.frames_rendered(), 0);
    }

    #[test]
    fn config_change_restarts_the_chain() {
        let mut render_loop = running_loop();
        let mut source = FixedSource(Some(SampleFrame::silent(2048)));
        render_loop.step(&mut source, &clock());

        let queued = render_loop.pending.unwrap();
        render_loop.toggle_style(StyleId::Spectrum);
        assert_ne!(render_loop.pending, Some(queued));
        assert_eq!(render_loop.scheduler().pending(), 1);
        assert_eq!(render_loop.on_tick(queued, &mut source, &clock()), TickOutcome::Stale);

        match render_loop.step(&mut source, &clock()) {
            Some(TickOutcome::Rendered(report)) => {
                assert_eq!(report.drawn, vec![StyleId::Line, StyleId::Spectrum]);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn config_change_while_stopped_does_not_start() {
        let mut render_loop = RenderLoop::new(
            ManualScheduler::new(),
            Compositor::default(),
            VisualConfig::default(),
        );
        render_loop.set_layout_mode(LayoutMode::Split);
        render_loop
            .update_style_setting(StyleId::Line, "thickness", json!(4))
            .unwrap();
        assert!(!render_loop.is_running());
        assert_eq!(render_loop.scheduler().pending(), 0);
    }

    #[test]
    fn rejected_setting_keeps_the_chain() {
        let mut render_loop = running_loop();
        let queued = render_loop.pending;
        assert!(render_loop
            .update_style_setting(StyleId::Line, "segments", json!(64))
            .is_err());
        assert_eq!(render_loop.pending, queued);
    }

    #[test]
    fn detached_container_skips_drawing() {
        let mut render_loop = running_loop();
        render_loop.set_container(None);
        let mut source = FixedSource(Some(SampleFrame::silent(2048)));
        match render_loop.step(&mut source, &clock()) {
            Some(TickOutcome::Rendered(report)) => {
                assert!(report.drawn.is_empty());
                assert_eq!(report.skipped, vec![StyleId::Line]);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(render_loop.is_running());
    }
}
