//! Error types shared across the workspace.
//!
//! Each domain crate keeps its own error enum (`StoreError`,
//! `SubmissionError`, `InventoryError`); this module only carries the
//! errors that belong to loading and validating a [`ProbeConfig`].
//!
//! [`ProbeConfig`]: crate::config::ProbeConfig

/// Top-level error type for orderprobe-core.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// Configuration loading or validation failure.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error while reading configuration.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// The configuration file is not valid TOML or has the wrong shape.
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// A field holds a value outside its allowed range.
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
