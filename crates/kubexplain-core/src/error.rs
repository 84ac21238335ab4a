//! Core error types

use serde::Serialize;
use thiserror::Error;

/// Why a single document could not become a tree
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("disallowed tag '{tag}': explicit YAML tags are not accepted")]
    DisallowedTag { tag: String },

    #[error("unsupported non-scalar mapping key")]
    NonScalarKey,
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// A document that could not be parsed
///
/// Carried next to the successfully parsed documents instead of aborting the
/// whole split.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("document {index}: {message}")]
pub struct ParseError {
    /// Position of the failing segment in the input (0-based)
    pub index: usize,
    /// Underlying syntax problem
    pub message: String,
}

impl ParseError {
    pub fn new(index: usize, message: impl Into<String>) -> Self {
        Self {
            index,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display_names_index() {
        let err = ParseError::new(3, "did not find expected key");
        assert_eq!(err.to_string(), "document 3: did not find expected key");
    }

    #[test]
    fn test_disallowed_tag_display() {
        let err = CoreError::DisallowedTag {
            tag: "!!python/object".to_string(),
        };
        assert!(err.to_string().contains("!!python/object"));
    }
}
