//! CLI-specific error types and exit code mapping

use orderprobe_core::error::ProbeError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The run finished without passing every scenario.
    #[error("run failed: {0}")]
    RunFailed(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped error from orderprobe-core (configuration loading).
    #[error("{0}")]
    Core(#[from] ProbeError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                                 |
    /// |------|---------------------------------------------------------|
    /// | 0    | Success                                                 |
    /// | 1    | Connectivity failure, failed scenario, cancel, or other |
    /// | 1    | I/O error, including reading the configuration file     |
    /// | 2    | Configuration error                                     |
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Core(ProbeError::Io(_)) => 1,
            Self::Config(_) | Self::Core(_) => 2,
            Self::RunFailed(_) | Self::Command(_) | Self::JsonSerialize(_) | Self::Io(_) => 1,
        }
    }
}
