use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sonoscope", about = "Audio-reactive waveform and spectrum visualizer")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: Option<PathBuf>,

    /// Output snapshot (.png or .ppm). Split layout writes one file per style.
    #[arg(short, long, default_value = "frame.png")]
    pub output: PathBuf,

    /// Active styles (comma-separated): line, bars, spectrum, circular,
    /// mirrored, rms, wave3d
    #[arg(short, long, value_delimiter = ',')]
    pub styles: Vec<String>,

    /// Layout mode: overlay or split
    #[arg(short, long, default_value = "overlay")]
    pub layout: String,

    /// Container width in logical pixels
    #[arg(long, default_value_t = 640)]
    pub width: u32,

    /// Surface height in logical pixels
    #[arg(long, default_value_t = 300)]
    pub height: u32,

    /// Device pixel ratio
    #[arg(long, default_value_t = 1.0)]
    pub scale: f32,

    /// Playback position to render, in seconds
    #[arg(long, default_value_t = 0.0)]
    pub at: f64,

    /// Ticks per second of simulated playback
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Render the static waveform preview instead of a live frame
    #[arg(long)]
    pub preview: bool,

    /// Write the waveform peaks as JSON
    #[arg(long)]
    pub peaks_output: Option<PathBuf>,

    /// Number of waveform preview bars
    #[arg(long, default_value_t = 1500)]
    pub bars: usize,

    /// Style setting override (e.g. --set spectrum.columns=64)
    #[arg(long = "set")]
    pub settings: Vec<String>,

    /// Config file (default: ./sonoscope.toml or ~/.config/sonoscope/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// List available styles and exit
    #[arg(long)]
    pub list_styles: bool,
}
