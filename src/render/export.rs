use anyhow::{Context, Result};
use image::{DynamicImage, RgbImage, RgbaImage};
use std::path::Path;

use super::canvas::Canvas;

/// Copy a canvas into an RGB image. Unpainted pixels come out black.
/// Returns `None` when the canvas has no backing pixels.
pub fn snapshot_image(canvas: &Canvas) -> Option<RgbImage> {
    if canvas.pixels().is_empty() {
        return None;
    }
    let rgba = RgbaImage::from_raw(canvas.width(), canvas.height(), canvas.pixels().to_vec())?;
    Some(DynamicImage::ImageRgba8(rgba).to_rgb8())
}

/// Save a canvas snapshot; the format follows the file extension
/// (`.png`, `.ppm`).
pub fn write_snapshot(canvas: &Canvas, path: &Path) -> Result<()> {
    let image = snapshot_image(canvas).with_context(|| {
        format!(
            "Surface {}x{} has no pixels to write to {}",
            canvas.width(),
            canvas.height(),
            path.display()
        )
    })?;
    image
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!(
        "Wrote {}x{} snapshot to {}",
        canvas.width(),
        canvas.height(),
        path.display()
    );
    Ok(())
}
