//! The seven visual styles: identifiers, strongly-typed settings and the
//! drawers themselves.
//!
//! Settings accept the legacy loosely-typed payloads (camelCase keys, any
//! missing field falling back to its default) and are clamped to the ranges
//! the settings panel allows before they ever reach a drawer.

pub mod bars;
pub mod circular;
pub mod line;
pub mod rms;
pub mod spectrum;
pub mod wave3d;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, VizError};
use crate::render::color::Rgb;

/// Identifies a visual style. The declaration order is the canonical draw
/// order used by the compositor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleId {
    Line,
    Bars,
    Spectrum,
    Circular,
    Mirrored,
    Rms,
    Wave3d,
}

impl StyleId {
    pub const ALL: [StyleId; 7] = [
        StyleId::Line,
        StyleId::Bars,
        StyleId::Spectrum,
        StyleId::Circular,
        StyleId::Mirrored,
        StyleId::Rms,
        StyleId::Wave3d,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StyleId::Line => "line",
            StyleId::Bars => "bars",
            StyleId::Spectrum => "spectrum",
            StyleId::Circular => "circular",
            StyleId::Mirrored => "mirrored",
            StyleId::Rms => "rms",
            StyleId::Wave3d => "wave3d",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StyleId::Line => "Waveform (Line)",
            StyleId::Bars => "Waveform (Bars)",
            StyleId::Spectrum => "Spectrum (Bars)",
            StyleId::Circular => "Spectrum (Circular)",
            StyleId::Mirrored => "Waveform (Mirrored Bars)",
            StyleId::Rms => "Waveform (RMS Curve)",
            StyleId::Wave3d => "Waveform (3D Ridge)",
        }
    }

    /// Whether the style reads the frequency-domain buffer.
    pub fn uses_spectrum(self) -> bool {
        matches!(self, StyleId::Spectrum | StyleId::Circular)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StyleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StyleId {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        StyleId::ALL
            .into_iter()
            .find(|id| id.as_str() == wanted)
            .ok_or_else(|| VizError::UnknownStyle(s.to_string()))
    }
}

/// The set of active styles. Iteration always follows the canonical draw
/// order, independent of the order styles were toggled on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectedStyles(BTreeSet<StyleId>);

impl SelectedStyles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a style on or off; returns whether it is now active.
    pub fn toggle(&mut self, id: StyleId) -> bool {
        if self.0.remove(&id) {
            false
        } else {
            self.0.insert(id);
            true
        }
    }

    pub fn contains(&self, id: StyleId) -> bool {
        self.0.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = StyleId> + '_ {
        self.0.iter().copied()
    }

    pub fn as_set(&self) -> &BTreeSet<StyleId> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<StyleId> for SelectedStyles {
    fn from_iter<I: IntoIterator<Item = StyleId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Axis-aligned rectangle in logical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

// ---------------------------------------------------------------------------
// Per-style settings
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LineSettings {
    pub color: Rgb,
    pub thickness: f32,
    pub sensitivity: f32,
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            color: Rgb::new(0x5a, 0xc8, 0xfa),
            thickness: 2.0,
            sensitivity: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BarsSettings {
    pub color: Rgb,
    pub thickness: f32,
    pub sensitivity: f32,
    #[serde(deserialize_with = "lenient_count")]
    pub columns: u32,
}

impl Default for BarsSettings {
    fn default() -> Self {
        Self {
            color: Rgb::new(0x34, 0xc7, 0x59),
            thickness: 1.0,
            sensitivity: 1.0,
            columns: 200,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpectrumSettings {
    pub color: Rgb,
    pub thickness: f32,
    pub sensitivity: f32,
    #[serde(deserialize_with = "lenient_count")]
    pub columns: u32,
    /// Panel color painted behind the segmented bars.
    pub backdrop: Rgb,
}

impl Default for SpectrumSettings {
    fn default() -> Self {
        Self {
            color: Rgb::new(0xff, 0x9f, 0x0a),
            thickness: 1.0,
            sensitivity: 1.0,
            columns: 128,
            backdrop: Rgb::new(0x0b, 0x10, 0x20),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CircularSettings {
    pub color: Rgb,
    pub thickness: f32,
    pub sensitivity: f32,
    pub radius_scale: f32,
    #[serde(deserialize_with = "lenient_count")]
    pub segments: u32,
}

impl Default for CircularSettings {
    fn default() -> Self {
        Self {
            color: Rgb::new(0xa7, 0x8b, 0xfa),
            thickness: 2.0,
            sensitivity: 1.0,
            radius_scale: 0.6,
            segments: 128,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MirroredSettings {
    pub color: Rgb,
    pub thickness: f32,
    pub sensitivity: f32,
    #[serde(deserialize_with = "lenient_count")]
    pub columns: u32,
}

impl Default for MirroredSettings {
    fn default() -> Self {
        Self {
            color: Rgb::new(0xff, 0x37, 0x5f),
            thickness: 1.0,
            sensitivity: 1.0,
            columns: 220,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RmsSettings {
    pub color: Rgb,
    pub thickness: f32,
    /// Number of consecutive samples averaged per output column.
    #[serde(deserialize_with = "lenient_count")]
    pub window: u32,
}

impl Default for RmsSettings {
    fn default() -> Self {
        Self {
            color: Rgb::new(0xff, 0xd6, 0x0a),
            thickness: 2.0,
            window: 32,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Wave3dSettings {
    pub color: Rgb,
    pub shadow: Rgb,
    pub highlight: Rgb,
    #[serde(deserialize_with = "lenient_count")]
    pub layers: u32,
    pub depth: f32,
    pub tilt: f32,
    pub sensitivity: f32,
}

impl Default for Wave3dSettings {
    fn default() -> Self {
        Self {
            color: Rgb::new(0x5a, 0xc8, 0xfa),
            shadow: Rgb::new(0x0a, 0x10, 0x25),
            highlight: Rgb::new(0x9a, 0xd8, 0xff),
            layers: 12,
            depth: 8.0,
            tilt: 0.4,
            sensitivity: 1.0,
        }
    }
}

/// Settings for one style, tagged by the style they belong to.
#[derive(Clone, Debug, PartialEq)]
pub enum StyleSettings {
    Line(LineSettings),
    Bars(BarsSettings),
    Spectrum(SpectrumSettings),
    Circular(CircularSettings),
    Mirrored(MirroredSettings),
    Rms(RmsSettings),
    Wave3d(Wave3dSettings),
}

impl StyleSettings {
    pub fn defaults(id: StyleId) -> Self {
        match id {
            StyleId::Line => StyleSettings::Line(LineSettings::default()),
            StyleId::Bars => StyleSettings::Bars(BarsSettings::default()),
            StyleId::Spectrum => StyleSettings::Spectrum(SpectrumSettings::default()),
            StyleId::Circular => StyleSettings::Circular(CircularSettings::default()),
            StyleId::Mirrored => StyleSettings::Mirrored(MirroredSettings::default()),
            StyleId::Rms => StyleSettings::Rms(RmsSettings::default()),
            StyleId::Wave3d => StyleSettings::Wave3d(Wave3dSettings::default()),
        }
    }

    pub fn style(&self) -> StyleId {
        match self {
            StyleSettings::Line(_) => StyleId::Line,
            StyleSettings::Bars(_) => StyleId::Bars,
            StyleSettings::Spectrum(_) => StyleId::Spectrum,
            StyleSettings::Circular(_) => StyleId::Circular,
            StyleSettings::Mirrored(_) => StyleId::Mirrored,
            StyleSettings::Rms(_) => StyleId::Rms,
            StyleSettings::Wave3d(_) => StyleId::Wave3d,
        }
    }

    /// Primary stroke / fill color of the style.
    pub fn color(&self) -> Rgb {
        match self {
            StyleSettings::Line(s) => s.color,
            StyleSettings::Bars(s) => s.color,
            StyleSettings::Spectrum(s) => s.color,
            StyleSettings::Circular(s) => s.color,
            StyleSettings::Mirrored(s) => s.color,
            StyleSettings::Rms(s) => s.color,
            StyleSettings::Wave3d(s) => s.color,
        }
    }

    /// Clamp every numeric field into the range the settings panel allows.
    pub fn clamped(self) -> Self {
        match self {
            StyleSettings::Line(s) => StyleSettings::Line(LineSettings {
                thickness: bounded(s.thickness, 1.0, 8.0, 2.0),
                sensitivity: bounded_sensitivity(s.sensitivity),
                ..s
            }),
            StyleSettings::Bars(s) => StyleSettings::Bars(BarsSettings {
                sensitivity: bounded_sensitivity(s.sensitivity),
                columns: s.columns.clamp(50, 400),
                ..s
            }),
            StyleSettings::Spectrum(s) => StyleSettings::Spectrum(SpectrumSettings {
                sensitivity: bounded_sensitivity(s.sensitivity),
                columns: s.columns.clamp(32, 512),
                ..s
            }),
            StyleSettings::Circular(s) => StyleSettings::Circular(CircularSettings {
                thickness: bounded(s.thickness, 1.0, 6.0, 2.0),
                sensitivity: bounded_sensitivity(s.sensitivity),
                radius_scale: bounded(s.radius_scale, 0.2, 0.9, 0.6),
                segments: s.segments.clamp(32, 512),
                ..s
            }),
            StyleSettings::Mirrored(s) => StyleSettings::Mirrored(MirroredSettings {
                sensitivity: bounded_sensitivity(s.sensitivity),
                columns: s.columns.clamp(50, 400),
                ..s
            }),
            StyleSettings::Rms(s) => StyleSettings::Rms(RmsSettings {
                thickness: bounded(s.thickness, 1.0, 6.0, 2.0),
                window: s.window.clamp(8, 256),
                ..s
            }),
            StyleSettings::Wave3d(s) => StyleSettings::Wave3d(Wave3dSettings {
                layers: s.layers.clamp(3, 24),
                depth: bounded(s.depth, 2.0, 24.0, 8.0),
                tilt: bounded(s.tilt, 0.0, 1.5, 0.4),
                sensitivity: bounded_sensitivity(s.sensitivity),
                ..s
            }),
        }
    }

    /// Return a copy with one field replaced, using the legacy payload key.
    pub fn with_setting(&self, key: &str, value: serde_json::Value) -> Result<Self> {
        let style = self.style();
        let updated = match self {
            StyleSettings::Line(s) => StyleSettings::Line(merge_field(style, s, key, value)?),
            StyleSettings::Bars(s) => StyleSettings::Bars(merge_field(style, s, key, value)?),
            StyleSettings::Spectrum(s) => {
                StyleSettings::Spectrum(merge_field(style, s, key, value)?)
            }
            StyleSettings::Circular(s) => {
                StyleSettings::Circular(merge_field(style, s, key, value)?)
            }
            StyleSettings::Mirrored(s) => {
                StyleSettings::Mirrored(merge_field(style, s, key, value)?)
            }
            StyleSettings::Rms(s) => StyleSettings::Rms(merge_field(style, s, key, value)?),
            StyleSettings::Wave3d(s) => StyleSettings::Wave3d(merge_field(style, s, key, value)?),
        };
        Ok(updated.clamped())
    }
}

/// Settings for every style, always complete.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleBook {
    entries: [StyleSettings; 7],
}

impl Default for StyleBook {
    fn default() -> Self {
        Self {
            entries: StyleId::ALL.map(StyleSettings::defaults),
        }
    }
}

impl StyleBook {
    pub fn get(&self, id: StyleId) -> &StyleSettings {
        &self.entries[id.index()]
    }

    /// Replace a style's settings wholesale (clamped).
    pub fn set(&mut self, settings: StyleSettings) {
        let id = settings.style();
        self.entries[id.index()] = settings.clamped();
    }

    /// Apply a single `key = value` update; rejected updates leave the book
    /// untouched.
    pub fn update(&mut self, id: StyleId, key: &str, value: serde_json::Value) -> Result<()> {
        let updated = self.get(id).with_setting(key, value)?;
        self.entries[id.index()] = updated;
        Ok(())
    }
}

/// Per-style tables as they appear in a configuration file; absent tables
/// and absent fields take their defaults.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct StyleTables {
    pub line: LineSettings,
    pub bars: BarsSettings,
    pub spectrum: SpectrumSettings,
    pub circular: CircularSettings,
    pub mirrored: MirroredSettings,
    pub rms: RmsSettings,
    pub wave3d: Wave3dSettings,
}

impl From<StyleTables> for StyleBook {
    fn from(tables: StyleTables) -> Self {
        let mut book = StyleBook::default();
        book.set(StyleSettings::Line(tables.line));
        book.set(StyleSettings::Bars(tables.bars));
        book.set(StyleSettings::Spectrum(tables.spectrum));
        book.set(StyleSettings::Circular(tables.circular));
        book.set(StyleSettings::Mirrored(tables.mirrored));
        book.set(StyleSettings::Rms(tables.rms));
        book.set(StyleSettings::Wave3d(tables.wave3d));
        book
    }
}

fn merge_field<T>(style: StyleId, current: &T, key: &str, value: serde_json::Value) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let invalid = |source| VizError::InvalidSetting {
        style: style.to_string(),
        key: key.to_string(),
        source,
    };
    let unknown = || VizError::UnknownSetting {
        style: style.to_string(),
        key: key.to_string(),
    };

    let mut record = serde_json::to_value(current).map_err(invalid)?;
    let serde_json::Value::Object(fields) = &mut record else {
        return Err(unknown());
    };

    let field = if fields.contains_key(key) {
        key.to_string()
    } else {
        camel_case(key)
    };
    if !fields.contains_key(&field) {
        return Err(unknown());
    }
    fields.insert(field, value);

    serde_json::from_value(record).map_err(invalid)
}

fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for ch in key.chars() {
        if ch == '_' || ch == '-' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn bounded(value: f32, lo: f32, hi: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(lo, hi)
    } else {
        fallback
    }
}

fn bounded_sensitivity(value: f32) -> f32 {
    bounded(value, 0.1, 5.0, 1.0)
}

/// Accept any JSON/TOML number for integer fields; settings panels send
/// floats.
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() {
        return Err(serde::de::Error::custom("expected a finite number"));
    }
    Ok(raw.round().clamp(0.0, u32::MAX as f64) as u32)
}
