//! Error types for keysim

use thiserror::Error;

/// Result type alias for keysim operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in keysim
#[derive(Debug, Error)]
pub enum Error {
    /// Structurally invalid layout description.
    ///
    /// `row` and `token` are 1-based positions in the raw data; `token` is 0
    /// when the whole row is at fault.
    #[error("Malformed layout at row {row}, token {token}: {message}")]
    MalformedLayout {
        row: usize,
        token: usize,
        message: String,
    },

    /// Layout text is not valid (relaxed) JSON
    #[error("Layout JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Color value could not be parsed
    #[error("Invalid color '{0}'")]
    Color(String),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unknown layout or case color preset
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    /// Terminal/TUI error
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    pub(crate) fn malformed(row: usize, token: usize, message: impl Into<String>) -> Self {
        Self::MalformedLayout {
            row,
            token,
            message: message.into(),
        }
    }

    /// True for errors raised by the layout parser
    pub fn is_malformed_layout(&self) -> bool {
        matches!(self, Self::MalformedLayout { .. } | Self::Json(_))
    }
}
