/// Midpoint of an 8-bit time-domain sample (silence).
pub const SAMPLE_MIDPOINT: f32 = 128.0;

/// One tick's worth of analyser output.
///
/// `time_domain` holds N unsigned samples centred at 128; `freq_domain`
/// holds N/2 magnitudes in 0..=255.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SampleFrame {
    pub time_domain: Vec<u8>,
    pub freq_domain: Vec<u8>,
}

impl SampleFrame {
    pub fn new(time_domain: Vec<u8>, freq_domain: Vec<u8>) -> Self {
        Self {
            time_domain,
            freq_domain,
        }
    }

    /// A frame of silence for an analysis window of `window` samples.
    pub fn silent(window: usize) -> Self {
        Self {
            time_domain: vec![128; window],
            freq_domain: vec![0; window / 2],
        }
    }
}

/// Signed amplitude of a time-domain byte in roughly [-1, 1].
#[inline]
pub fn amplitude(sample: u8) -> f32 {
    sample as f32 / SAMPLE_MIDPOINT - 1.0
}

/// Playback position as a fraction of the track, in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackProgress(f32);

impl PlaybackProgress {
    /// `None` while the duration is unknown (zero, negative or non-finite).
    pub fn from_times(current_time: f64, duration: f64) -> Option<Self> {
        if !duration.is_finite() || duration <= 0.0 {
            return None;
        }
        let ratio = if current_time.is_finite() {
            (current_time / duration).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Some(Self(ratio as f32))
    }

    pub fn fraction(self) -> f32 {
        self.0
    }
}

/// Map a click at `x` on a surface `width` pixels wide to a playback time.
pub fn seek_time(x: f32, width: f32, duration: f64) -> f64 {
    if width <= 0.0 || !duration.is_finite() || duration <= 0.0 {
        return 0.0;
    }
    let ratio = (x / width).clamp(0.0, 1.0);
    ratio as f64 * duration
}

/// Format seconds as `m:ss`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() {
        return "0:00".to_string();
    }
    let total = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
