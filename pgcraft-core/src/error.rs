//! Error types for the generator.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The input driver is not supported by this generator.
    #[error("pgcraft only supports the postgres driver, got {0:?}")]
    Driver(String),

    /// A configuration flag was rejected.
    #[error("config error: flag {name:?}: {message}")]
    Config { name: String, message: String },

    /// A template partial failed to render.
    #[error("render error in {file}: {message}")]
    Render { file: String, message: String },

    /// A post-phase formatter failed; the filename is always included.
    #[error("format error in {file} ({formatter}): {message}")]
    Format {
        file: String,
        formatter: &'static str,
        message: String,
    },

    /// The run was cancelled between entities.
    #[error("generation cancelled")]
    Cancelled,
}

impl Error {
    pub fn config(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for generator operations.
pub type Result<T> = std::result::Result<T, Error>;
