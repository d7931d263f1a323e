//! Offline stand-in for a browser analyser node: turns the most recent
//! window of PCM into the 8-bit time- and frequency-domain buffers the
//! drawers consume.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use crate::frame::SampleFrame;

pub const DEFAULT_FFT_SIZE: usize = 2048;
pub const DEFAULT_SMOOTHING: f32 = 0.85;
pub const MIN_DECIBELS: f32 = -100.0;
pub const MAX_DECIBELS: f32 = -30.0;

const MIN_FFT_SIZE: usize = 32;
const MAX_FFT_SIZE: usize = 32768;

pub struct Analyser {
    fft: Arc<dyn Fft<f32>>,
    size: usize,
    smoothing: f32,
    window: Vec<f32>,
    smoothed: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

impl Analyser {
    /// `fft_size` is rounded up to a power of two within 32..=32768;
    /// `smoothing` is clamped to [0, 1].
    pub fn new(fft_size: usize, smoothing: f32) -> Self {
        let size = fft_size
            .clamp(MIN_FFT_SIZE, MAX_FFT_SIZE)
            .next_power_of_two();
        let smoothing = if smoothing.is_finite() {
            smoothing.clamp(0.0, 1.0)
        } else {
            DEFAULT_SMOOTHING
        };
        let mut planner = FftPlanner::<f32>::new();
        Self {
            fft: planner.plan_fft_forward(size),
            size,
            smoothing,
            window: blackman_window(size),
            smoothed: vec![0.0; size / 2],
            scratch: vec![Complex::new(0.0, 0.0); size],
        }
    }

    pub fn fft_size(&self) -> usize {
        self.size
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.size / 2
    }

    /// Forget the smoothed spectrum, as after a seek.
    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
    }

    /// Analyse the last `fft_size` samples of `recent`. Shorter input is
    /// treated as preceded by silence.
    pub fn analyse(&mut self, recent: &[f32]) -> SampleFrame {
        let tail = &recent[recent.len().saturating_sub(self.size)..];
        let pad = self.size - tail.len();

        let time_domain: Vec<u8> = std::iter::repeat(0.0)
            .take(pad)
            .chain(tail.iter().copied())
            .map(time_domain_byte)
            .collect();

        for (i, slot) in self.scratch.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { tail[i - pad] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft.process(&mut self.scratch);

        let scale = 1.0 / self.size as f32;
        let tau = self.smoothing;
        let freq_domain = self
            .smoothed
            .iter_mut()
            .zip(self.scratch.iter())
            .map(|(smoothed, bin)| {
                let magnitude = bin.norm() * scale;
                *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;
                decibel_byte(*smoothed)
            })
            .collect();

        SampleFrame::new(time_domain, freq_domain)
    }
}

fn blackman_window(size: usize) -> Vec<f32> {
    let n = size as f32;
    (0..size)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / n;
            0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos()
        })
        .collect()
}

fn time_domain_byte(sample: f32) -> u8 {
    if !sample.is_finite() {
        return 128;
    }
    (128.0 * (1.0 + sample)).floor().clamp(0.0, 255.0) as u8
}

fn decibel_byte(magnitude: f32) -> u8 {
    if magnitude <= 0.0 || !magnitude.is_finite() {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    let scaled = 255.0 / (MAX_DECIBELS - MIN_DECIBELS) * (db - MIN_DECIBELS);
    scaled.floor().clamp(0.0, 255.0) as u8
}
