use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, VizError};
use crate::styles::{SelectedStyles, StyleBook, StyleId};

/// How active styles are mapped onto surfaces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Every active style composited onto one surface.
    #[default]
    Overlay,
    /// One surface per active style.
    Split,
}

impl LayoutMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LayoutMode::Overlay => "overlay",
            LayoutMode::Split => "split",
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutMode {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overlay" => Ok(LayoutMode::Overlay),
            "split" => Ok(LayoutMode::Split),
            _ => Err(VizError::UnknownLayout(s.to_string())),
        }
    }
}

/// Everything the configuration layer may change between ticks.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualConfig {
    pub selected: SelectedStyles,
    pub layout: LayoutMode,
    pub styles: StyleBook,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            selected: [StyleId::Line].into_iter().collect(),
            layout: LayoutMode::Overlay,
            styles: StyleBook::default(),
        }
    }
}

impl VisualConfig {
    /// Apply one legacy `key = value` update to a style's settings.
    pub fn update_style_setting(
        &mut self,
        style: StyleId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<()> {
        self.styles.update(style, key, value).inspect_err(|e| {
            log::warn!("Rejected setting update: {}", e);
        })
    }

    /// Returns whether the style is active afterwards.
    pub fn toggle_style(&mut self, style: StyleId) -> bool {
        let active = self.selected.toggle(style);
        log::debug!("Style {} {}", style, if active { "on" } else { "off" });
        active
    }

    pub fn set_layout_mode(&mut self, mode: LayoutMode) {
        if self.layout != mode {
            log::debug!("Layout {} -> {}", self.layout, mode);
        }
        self.layout = mode;
    }
}
