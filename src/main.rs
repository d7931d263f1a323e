mod cli;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use cli::Cli;
use sonoscope::audio::analyser::Analyser;
use sonoscope::audio::decode::decode_track;
use sonoscope::audio::peaks::compute_peaks;
use sonoscope::audio::track::{TrackClock, TrackSource};
use sonoscope::compositor::Compositor;
use sonoscope::frame::{format_time, PlaybackProgress};
use sonoscope::render::export::write_snapshot;
use sonoscope::scheduler::{ManualScheduler, PlaybackClock, RenderLoop, TickOutcome};
use sonoscope::styles::{SelectedStyles, StyleBook, StyleId};
use sonoscope::{LayoutMode, Rgb, Viewport, VisualConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    if cli.list_styles {
        println!("Available styles:");
        for id in StyleId::ALL {
            println!("  {:<10} {}", id.as_str(), id.label());
        }
        return Ok(());
    }

    let config_path = cli.config.clone().or_else(config::discover_config);
    let cfg = match config_path {
        Some(ref path) => match config::load_config(path) {
            Some(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            None => {
                log::warn!("Failed to load config from {}", path.display());
                config::Config::default()
            }
        },
        None => config::Config::default(),
    };

    // Merge: config values apply only when CLI is at its default
    if cli.width == 640 { cli.width = cfg.display.width; }
    if cli.height == 300 { cli.height = cfg.display.height; }
    if cli.scale == 1.0 { cli.scale = cfg.display.device_scale; }
    if cli.fps == 60 { cli.fps = cfg.analysis.fps; }
    if cli.bars == 1500 { cli.bars = cfg.analysis.peaks; }
    if cli.layout == "overlay" { cli.layout = cfg.display.layout.clone(); }
    if cli.styles.is_empty() { cli.styles = cfg.display.styles.clone(); }

    let input = cli.input.as_ref().context("Input audio file is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let mut visual = VisualConfig {
        selected: parse_styles(&cli.styles)?,
        layout: cli.layout.parse::<LayoutMode>()?,
        styles: StyleBook::from(cfg.styles),
    };
    for setting in &cli.settings {
        apply_setting(&mut visual, setting)?;
    }
    let background = Rgb::parse(&cfg.display.background).context("Invalid display.background")?;

    log::info!("sonoscope - audio-reactive visualizer");
    log::info!("Input: {}", input.display());
    log::info!(
        "Styles: {} ({} layout)",
        visual.selected.iter().map(StyleId::as_str).collect::<Vec<_>>().join(", "),
        visual.layout
    );
    log::info!("Surface: {}x{} @ {:.2}x", cli.width, cli.height, cli.scale);

    // 1. Decode audio
    log::info!("Decoding audio...");
    let track = decode_track(input)?;
    let duration = track.duration();

    // 2. Waveform peaks for the static preview
    let peaks = compute_peaks(&track.first_channel, cli.bars);
    log::info!("Computed {} waveform peaks", peaks.len());
    if let Some(ref path) = cli.peaks_output {
        let json = serde_json::to_string(&peaks).context("Failed to serialize peaks")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write peaks to {}", path.display()))?;
        log::info!("Wrote peaks to {}", path.display());
    }

    let compositor = Compositor::new(cli.height, cfg.display.preview_height, background);
    let viewport = Viewport::new(cli.width, cli.scale);
    let at = cli.at.clamp(0.0, duration);

    // 3a. Static preview
    if cli.preview {
        let mut compositor = compositor;
        let progress = PlaybackProgress::from_times(at, duration);
        if !compositor.render_preview(&peaks, progress, visual.layout, Some(&viewport)) {
            anyhow::bail!("The waveform preview is only available in overlay layout");
        }
        if let Some(surface) = compositor.overlay_surface() {
            write_snapshot(surface.canvas(), &cli.output)?;
        }
        return Ok(());
    }

    // 3b. Drive the render loop tick by tick up to the requested position
    let fps = cli.fps.max(1) as f64;
    let total_ticks = (at * fps).round() as u64 + 1;
    log::info!("Rendering {} ticks up to {} / {}", total_ticks, format_time(at), format_time(duration));

    let analyser = Analyser::new(cfg.analysis.fft_size, cfg.analysis.smoothing);
    let mut source = TrackSource::new(track.mono, track.sample_rate, analyser);
    let mut clock = TrackClock::new(duration);
    let mut render_loop = RenderLoop::new(ManualScheduler::new(), compositor, visual);
    render_loop.set_container(Some(viewport));
    render_loop.start();

    let pb = ProgressBar::new(total_ticks);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ticks ({eta} remaining)")?
            .progress_chars("=>-"),
    );

    for tick in 0..total_ticks {
        if tick > 0 {
            clock.advance(1.0 / fps);
        }
        source.seek(clock.current_time());
        match render_loop.step(&mut source, &clock) {
            Some(TickOutcome::Rendered(report)) if !report.skipped.is_empty() => {
                log::debug!("Tick {}: skipped {:?}", tick, report.skipped);
            }
            Some(TickOutcome::Rendered(_)) => {}
            Some(outcome) => log::debug!("Tick {}: {:?}", tick, outcome),
            None => anyhow::bail!("Render loop stopped unexpectedly"),
        }
        pb.inc(1);
        if clock.is_finished() {
            break;
        }
    }
    pb.finish_with_message("Rendering complete");

    // 4. Snapshot the surfaces
    let compositor = render_loop.compositor();
    match render_loop.config().layout {
        LayoutMode::Overlay => {
            let surface = compositor.overlay_surface().context("Nothing was rendered")?;
            write_snapshot(surface.canvas(), &cli.output)?;
        }
        LayoutMode::Split => {
            for id in compositor.split_surfaces().ids() {
                if let Some(surface) = compositor.split_surfaces().get(id) {
                    write_snapshot(surface.canvas(), &split_output_path(&cli.output, id))?;
                }
            }
        }
    }
    render_loop.stop();

    log::info!("Done at {}", format_time(clock.current_time()));
    Ok(())
}

fn parse_styles(names: &[String]) -> Result<SelectedStyles> {
    names
        .iter()
        .filter(|name| !name.trim().is_empty())
        .map(|name| name.parse::<StyleId>().map_err(anyhow::Error::from))
        .collect()
}

/// Apply a `style.key=value` override. Values are read as JSON when they
/// parse, otherwise as a bare string (so `line.color=#ff0000` works).
fn apply_setting(visual: &mut VisualConfig, setting: &str) -> Result<()> {
    let (path, raw) = setting
        .split_once('=')
        .with_context(|| format!("Expected style.key=value, got '{}'", setting))?;
    let (style, key) = path
        .split_once('.')
        .with_context(|| format!("Expected style.key=value, got '{}'", setting))?;
    let style: StyleId = style.parse()?;
    let value = serde_json::from_str(raw.trim())
        .unwrap_or_else(|_| serde_json::Value::String(raw.trim().to_string()));
    visual
        .update_style_setting(style, key.trim(), value)
        .with_context(|| format!("Invalid setting '{}'", setting))?;
    Ok(())
}

fn split_output_path(output: &Path, style: StyleId) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("frame");
    let ext = output.extension().and_then(|e| e.to_str()).unwrap_or("png");
    output.with_file_name(format!("{}-{}.{}", stem, style.as_str(), ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonoscope::styles::StyleSettings;

    #[test]
    fn split_paths_carry_the_style_name() {
        let path = split_output_path(Path::new("out/frame.png"), StyleId::Wave3d);
        assert_eq!(path, PathBuf::from("out/frame-wave3d.png"));
        let bare = split_output_path(Path::new("snap"), StyleId::Rms);
        assert_eq!(bare, PathBuf::from("snap-rms.png"));
    }

    #[test]
    fn settings_accept_json_and_bare_strings() {
        let mut visual = VisualConfig::default();
        apply_setting(&mut visual, "spectrum.columns=64").unwrap();
        apply_setting(&mut visual, "line.color=#ff0000").unwrap();
        match visual.styles.get(StyleId::Spectrum) {
            StyleSettings::Spectrum(s) => assert_eq!(s.columns, 64),
            other => panic!("unexpected settings {:?}", other),
        }
        assert_eq!(visual.styles.get(StyleId::Line).color(), Rgb::new(255, 0, 0));

        assert!(apply_setting(&mut visual, "line.thickness").is_err());
        assert!(apply_setting(&mut visual, "scope.gain=2").is_err());
    }

    #[test]
    fn style_list_parses_in_canonical_order() {
        let selected = parse_styles(&["rms".into(), "Line".into(), " ".into()]).unwrap();
        assert_eq!(selected.iter().collect::<Vec<_>>(), vec![StyleId::Line, StyleId::Rms]);
        assert!(parse_styles(&["laser".into()]).is_err());
    }
}
