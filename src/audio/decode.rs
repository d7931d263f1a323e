use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// A fully decoded track.
#[derive(Debug, Clone, Default)]
pub struct DecodedTrack {
    /// All channels averaged; what an analyser node hears.
    pub mono: Vec<f32>,
    /// The first channel alone; source for the waveform preview.
    pub first_channel: Vec<f32>,
    pub sample_rate: u32,
    pub channels: usize,
}

impl DecodedTrack {
    /// Build a track from interleaved samples.
    pub fn from_interleaved(interleaved: &[f32], channels: usize, sample_rate: u32) -> Self {
        let channels = channels.max(1);
        let mut track = Self {
            mono: Vec::with_capacity(interleaved.len() / channels),
            first_channel: Vec::with_capacity(interleaved.len() / channels),
            sample_rate,
            channels,
        };
        track.push_interleaved(interleaved);
        track
    }

    fn push_interleaved(&mut self, interleaved: &[f32]) {
        for frame in interleaved.chunks_exact(self.channels) {
            self.first_channel.push(frame[0]);
            self.mono.push(frame.iter().sum::<f32>() / self.channels as f32);
        }
    }

    /// Length in seconds; 0 when the sample rate is unknown.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.mono.len() as f64 / self.sample_rate as f64
    }
}

pub fn decode_track(path: &Path) -> Result<DecodedTrack> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Failed to probe audio format")?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio tracks found")?;
    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count());
    let sample_rate = track.codec_params.sample_rate.context("Unknown sample rate")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create audio decoder")?;

    let mut decoded_track = DecodedTrack {
        sample_rate,
        channels: channels.max(1),
        ..DecodedTrack::default()
    };
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(e).context("Failed to read audio packet"),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(msg)) => {
                log::debug!("Skipping undecodable packet: {}", msg);
                skipped_packets += 1;
                continue;
            }
            Err(e) => return Err(e).context("Failed to decode audio packet"),
        };

        let mut buffer = SampleBuffer::<f32>::new(decoded.frames() as u64, *decoded.spec());
        buffer.copy_interleaved_ref(decoded);
        decoded_track.push_interleaved(buffer.samples());
    }

    if skipped_packets > 0 {
        log::warn!("Skipped {} corrupt packets", skipped_packets);
    }
    log::info!(
        "Decoded {}: {} frames, {} ch, {}Hz, {:.1}s",
        path.display(),
        decoded_track.mono.len(),
        decoded_track.channels,
        sample_rate,
        decoded_track.duration()
    );

    Ok(decoded_track)
}
