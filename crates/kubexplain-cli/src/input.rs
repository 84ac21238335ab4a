//! Reading manifests from files or stdin

use kubexplain_core::{Extraction, SplitResult, extract_all, split};
use std::io::Read;
use std::path::Path;

use crate::error::{CliError, Result};

/// A split and extracted manifest
pub struct Manifest {
    /// Where the text came from, for messages
    pub source: String,
    pub split: SplitResult,
    pub extraction: Extraction,
}

impl Manifest {
    /// Read and process `path`; `-` reads stdin
    pub fn load(path: &Path) -> Result<Self> {
        let (source, raw) = if path == Path::new("-") {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .map_err(|err| CliError::io("<stdin>", err))?;
            ("<stdin>".to_string(), raw)
        } else {
            let source = path.display().to_string();
            let raw = std::fs::read_to_string(path).map_err(|err| CliError::io(&source, err))?;
            (source, raw)
        };
        Ok(Self::from_text(source, &raw))
    }

    pub fn from_text(source: impl Into<String>, raw: &str) -> Self {
        let split = split(raw);
        let extraction = extract_all(&split);
        Self {
            source: source.into(),
            split,
            extraction,
        }
    }

    pub fn has_parse_errors(&self) -> bool {
        !self.split.errors.is_empty()
    }

    /// Add `parseErrors` and `unrecognized` to a JSON object
    pub fn with_problems(&self, mut output: serde_json::Value) -> serde_json::Value {
        if let Some(object) = output.as_object_mut() {
            object.insert(
                "parseErrors".to_string(),
                serde_json::json!(self.split.errors),
            );
            object.insert(
                "unrecognized".to_string(),
                self.extraction
                    .unrecognized
                    .iter()
                    .map(|u| serde_json::json!({ "index": u.index, "reason": u.reason.to_string() }))
                    .collect(),
            );
        }
        output
    }
}
