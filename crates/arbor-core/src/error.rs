//! Error types for Arbor

use thiserror::Error;

/// Result type alias using Arbor's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Arbor operations
#[derive(Error, Debug)]
pub enum Error {
    /// A parameter is outside its documented range or inconsistent with another
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Leaves are enabled but no material name starts with the configured prefix
    #[error("No leaf material matches the prefix '{prefix}'")]
    NoMatchingLeafMaterial { prefix: String },

    /// Export failed
    #[error("Export failed: {0}")]
    Export(String),

    /// Mesh import failed
    #[error("Import failed: {0}")]
    Import(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration (de)serialization error
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }
}
