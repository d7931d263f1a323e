/// Result alias for configuration entry points of the rendering core.
pub type Result<T> = std::result::Result<T, VizError>;

/// Errors raised while interpreting configuration input.
///
/// Rendering itself never fails: degenerate buffers and missing surfaces are
/// handled by skipping work for the current tick.
#[derive(Debug, thiserror::Error)]
pub enum VizError {
    #[error("unknown visual style '{0}'")]
    UnknownStyle(String),

    #[error("unknown layout mode '{0}' (expected 'overlay' or 'split')")]
    UnknownLayout(String),

    #[error("style '{style}' has no setting named '{key}'")]
    UnknownSetting { style: String, key: String },

    #[error("invalid value for '{style}.{key}': {source}")]
    InvalidSetting {
        style: String,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid color '{0}' (expected #rrggbb)")]
    InvalidColor(String),
}
