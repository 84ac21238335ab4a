//! CLI error types with exit code handling

use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Input could not be read
    #[error("Failed to read {path}: {message}")]
    #[diagnostic(code(kubexplain::cli::io))]
    Io { path: String, message: String },

    /// Settings file could not be loaded
    #[error("Invalid settings in {path}: {message}")]
    #[diagnostic(
        code(kubexplain::cli::settings),
        help("see `kubexplain --help` for the settings file location and fields")
    )]
    Settings { path: String, message: String },

    /// Rules overlay could not be loaded or compiled
    #[error(transparent)]
    #[diagnostic(transparent)]
    Rules(#[from] kubexplain_engine::EngineError),

    /// Internal error (serialization, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(kubexplain::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Settings { .. } => exit_codes::USAGE_ERROR,
            CliError::Rules(kubexplain_engine::EngineError::Io { .. }) => exit_codes::IO_ERROR,
            CliError::Rules(_) => exit_codes::USAGE_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    pub fn io(path: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::internal(err.to_string())
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
