use super::analyser::Analyser;
use crate::frame::SampleFrame;
use crate::scheduler::{PlaybackClock, SampleSource};

/// Feeds the render loop from a decoded track: the analyser looks at the
/// window of samples that ends at the current playback position.
pub struct TrackSource {
    samples: Vec<f32>,
    sample_rate: u32,
    analyser: Analyser,
    position: usize,
    frame: Option<SampleFrame>,
}

impl TrackSource {
    pub fn new(samples: Vec<f32>, sample_rate: u32, analyser: Analyser) -> Self {
        Self {
            samples,
            sample_rate,
            analyser,
            position: 0,
            frame: None,
        }
    }

    /// Move the analysis window so it ends at `seconds`.
    pub fn seek(&mut self, seconds: f64) {
        let target = if seconds.is_finite() && seconds > 0.0 {
            ((seconds * self.sample_rate as f64) as usize).min(self.samples.len())
        } else {
            0
        };
        if target != self.position || self.frame.is_none() {
            self.position = target;
            self.frame = None;
        }
    }

    pub fn position_samples(&self) -> usize {
        self.position
    }
}

impl SampleSource for TrackSource {
    fn latest(&mut self) -> Option<&SampleFrame> {
        if self.samples.is_empty() {
            return None;
        }
        if self.frame.is_none() {
            let frame = self.analyser.analyse(&self.samples[..self.position]);
            self.frame = Some(frame);
        }
        self.frame.as_ref()
    }
}

/// Playback clock advanced in fixed steps, one per rendered frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackClock {
    current: f64,
    duration: f64,
}

impl TrackClock {
    pub fn new(duration: f64) -> Self {
        Self {
            current: 0.0,
            duration,
        }
    }

    /// Move forward by `seconds`, stopping at the end of the track.
    pub fn advance(&mut self, seconds: f64) {
        self.current = (self.current + seconds).min(self.duration.max(0.0));
    }

    pub fn seek(&mut self, seconds: f64) {
        self.current = seconds.clamp(0.0, self.duration.max(0.0));
    }

    pub fn is_finished(&self) -> bool {
        self.current >= self.duration
    }
}

impl PlaybackClock for TrackClock {
    fn current_time(&self) -> f64 {
        self.current
    }

    fn duration(&self) -> f64 {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(samples: Vec<f32>) -> TrackSource {
        TrackSource::new(samples, 1000, Analyser::new(64, 0.0))
    }

    #[test]
    fn empty_track_is_never_ready() {
        let mut track = source(Vec::new());
        track.seek(1.0);
        assert!(track.latest().is_none());
    }

    #[test]
    fn window_ends_at_playback_position() {
        let mut samples = vec![0.0f32; 1000];
        samples[99] = 1.0;
        let mut track = source(samples);

        track.seek(0.1);
        assert_eq!(track.position_samples(), 100);
        let frame = track.latest().unwrap();
        assert_eq!(*frame.time_domain.last().unwrap(), 255);

        track.seek(0.2);
        let frame = track.latest().unwrap();
        assert!(frame.time_domain.iter().all(|&b| b == 128));
    }

    #[test]
    fn seeking_past_the_end_clamps() {
        let mut track = source(vec![0.5; 100]);
        track.seek(60.0);
        assert_eq!(track.position_samples(), 100);
        track.seek(f64::NAN);
        assert_eq!(track.position_samples(), 0);
    }

    #[test]
    fn per_frame_steps_reach_the_requested_time() {
        let mut clock = TrackClock::new(2.0);
        for _ in 0..30 {
            clock.advance(1.0 / 30.0);
        }
        assert!((clock.current_time() - 1.0).abs() < 1e-9);
        assert!(!clock.is_finished());
    }

    #[test]
    fn clock_stops_at_duration() {
        let mut clock = TrackClock::new(1.0);
        for _ in 0..100 {
            clock.advance(1.0 / 60.0);
        }
        assert_eq!(clock.current_time(), 1.0);
        assert!(clock.is_finished());

        clock.seek(-3.0);
        assert_eq!(clock.current_time(), 0.0);
    }
}
