//! Engine error types

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while building rule sets
///
/// Explaining and validating never fail; only loading rules can.
#[derive(Error, Debug, Diagnostic)]
pub enum EngineError {
    #[error("invalid rule pattern '{pattern}': {reason}")]
    #[diagnostic(
        code(kubexplain::rules::pattern),
        help("patterns look like `spec.containers[*].image` or `..labels`")
    )]
    InvalidPattern { pattern: String, reason: String },

    #[error("Failed to read rules file {path}: {source}")]
    #[diagnostic(code(kubexplain::rules::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse rules file {path}: {source}")]
    #[diagnostic(code(kubexplain::rules::parse))]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unsupported rules apiVersion '{found}', expected '{expected}'")]
    #[diagnostic(code(kubexplain::rules::version))]
    UnsupportedVersion { found: String, expected: String },
}

impl EngineError {
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
