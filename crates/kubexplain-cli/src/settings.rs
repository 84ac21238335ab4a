//! User settings
//!
//! Stored in `~/.config/kubexplain/config.yaml` (platform config dir):
//!
//! ```yaml
//! rules: /path/to/rules.yaml
//! output: json
//! strict: true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Settings file contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Settings {
    /// Rules overlay applied to every command
    pub rules: Option<PathBuf>,
    pub output: OutputFormat,
    /// Treat warnings as failures in `validate`
    pub strict: bool,
}

impl Settings {
    /// Load from an explicit file, or from the default location if it exists
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load settings from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|err| CliError::io(path.display().to_string(), err))?;
        let settings: Self = serde_yaml::from_str(&content).map_err(|err| CliError::Settings {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Get default settings path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("kubexplain").join("config.yaml"))
    }
}
