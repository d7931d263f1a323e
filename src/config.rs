use serde::Deserialize;
use std::path::{Path, PathBuf};

use sonoscope::styles::StyleTables;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub styles: StyleTables,
}

#[derive(Debug, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_layout")]
    pub layout: String,
    #[serde(default = "default_styles")]
    pub styles: Vec<String>,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_preview_height")]
    pub preview_height: u32,
    #[serde(default = "default_device_scale")]
    pub device_scale: f32,
    #[serde(default = "default_background")]
    pub background: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    #[serde(default = "default_smoothing")]
    pub smoothing: f32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_peaks")]
    pub peaks: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            layout: default_layout(),
            styles: default_styles(),
            width: default_width(),
            height: default_height(),
            preview_height: default_preview_height(),
            device_scale: default_device_scale(),
            background: default_background(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            smoothing: default_smoothing(),
            fps: default_fps(),
            peaks: default_peaks(),
        }
    }
}

fn default_layout() -> String { "overlay".into() }
fn default_styles() -> Vec<String> { vec!["line".into()] }
fn default_width() -> u32 { 640 }
fn default_height() -> u32 { 300 }
fn default_preview_height() -> u32 { 200 }
fn default_device_scale() -> f32 { 1.0 }
fn default_background() -> String { "#0b1020".into() }
fn default_fft_size() -> usize { 2048 }
fn default_smoothing() -> f32 { 0.85 }
fn default_fps() -> u32 { 60 }
fn default_peaks() -> usize { 1500 }

/// `./sonoscope.toml`, then `~/.config/sonoscope/config.toml`, then the
/// platform config directory.
pub fn discover_config() -> Option<PathBuf> {
    let local = PathBuf::from("sonoscope.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("sonoscope").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("sonoscope").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    parse_config(&content)
}

fn parse_config(content: &str) -> Option<Config> {
    match toml::from_str(content) {
        Ok(config) => Some(config),
        Err(err) => {
            log::warn!("Invalid config: {}", err);
            None
        }
    }
}
