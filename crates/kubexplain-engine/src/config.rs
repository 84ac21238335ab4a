//! User rule overlay
//!
//! A rules file extends the built-in tables:
//!
//! ```yaml
//! apiVersion: kubexplain.io/v1
//! explanations:
//!   - pattern: metadata.labels["team"]
//!     text: Owning team, used for paging.
//! kinds:
//!   Rollout: Argo Rollouts progressive delivery controller.
//! required:
//!   "*": [metadata.labels]
//! deprecated:
//!   - apiVersion: argoproj.io/v1alpha0
//!     replacement: argoproj.io/v1alpha1
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{EngineError, Result};

pub const RULES_API_VERSION: &str = "kubexplain.io/v1";

/// Rules file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesConfig {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default)]
    pub explanations: Vec<ExplanationConfig>,

    /// Kind descriptions, replacing built-ins with the same kind
    #[serde(default)]
    pub kinds: IndexMap<String, String>,

    /// Extra required paths per kind (`*` for every kind)
    #[serde(default)]
    pub required: IndexMap<String, Vec<String>>,

    #[serde(default)]
    pub deprecated: Vec<DeprecationConfig>,
}

fn default_api_version() -> String {
    RULES_API_VERSION.to_string()
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            explanations: Vec::new(),
            kinds: IndexMap::new(),
            required: IndexMap::new(),
            deprecated: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationConfig {
    pub pattern: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeprecationConfig {
    pub api_version: String,
    #[serde(default)]
    pub kind: Option<String>,
    pub replacement: String,
    #[serde(default)]
    pub removed_in: Option<String>,
}

impl RulesConfig {
    /// Load a rules file
    pub fn load_from(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_yaml_str(&content, &display)
    }

    /// Parse rules from YAML text; `origin` names the source in errors
    pub fn from_yaml_str(content: &str, origin: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content).map_err(|source| EngineError::Yaml {
            path: origin.to_string(),
            source,
        })?;

        if config.api_version != RULES_API_VERSION {
            return Err(EngineError::UnsupportedVersion {
                found: config.api_version,
                expected: RULES_API_VERSION.to_string(),
            });
        }

        tracing::debug!(
            origin,
            explanations = config.explanations.len(),
            kinds = config.kinds.len(),
            "loaded rules overlay"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSet;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const OVERLAY: &str = r#"
apiVersion: kubexplain.io/v1
explanations:
  - pattern: 'metadata.labels["team"]'
    text: Owning team.
kinds:
  Rollout: Progressive delivery controller.
  Pod: Custom pod text.
required:
  "*": [metadata.labels]
deprecated:
  - apiVersion: argoproj.io/v1alpha0
    kind: Rollout
    replacement: argoproj.io/v1alpha1
"#;

    #[test]
    fn test_parse_overlay() {
        let config = RulesConfig::from_yaml_str(OVERLAY, "test").unwrap();
        assert_eq!(config.explanations.len(), 1);
        assert_eq!(config.kinds["Rollout"], "Progressive delivery controller.");
        assert_eq!(config.required["*"], vec!["metadata.labels".to_string()]);
        assert_eq!(config.deprecated[0].removed_in, None);
    }

    #[test]
    fn test_missing_api_version_defaults() {
        let config = RulesConfig::from_yaml_str("kinds: {}\n", "test").unwrap();
        assert_eq!(config.api_version, RULES_API_VERSION);
    }

    #[test]
    fn test_wrong_api_version() {
        let err = RulesConfig::from_yaml_str("apiVersion: kubexplain.io/v9\n", "test").unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedVersion { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(OVERLAY.as_bytes()).unwrap();
        let config = RulesConfig::load_from(file.path()).unwrap();
        assert_eq!(config.kinds.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = RulesConfig::load_from(Path::new("/nonexistent/rules.yaml")).unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
    }

    #[test]
    fn test_overlay_applied_to_rule_set() {
        let config = RulesConfig::from_yaml_str(OVERLAY, "test").unwrap();
        let rules = RuleSet::builder().config(&config).build().unwrap();

        assert_eq!(rules.describe_kind("Pod"), Some("Custom pod text."));
        assert_eq!(
            rules.describe_kind("Rollout"),
            Some("Progressive delivery controller.")
        );
        assert!(rules.describe_kind("Deployment").is_some());

        let required: Vec<&str> = rules
            .required_paths("Rollout")
            .map(|r| r.as_str())
            .collect();
        assert_eq!(required, vec!["metadata.name", "metadata.labels"]);

        let dep = rules.deprecation("Rollout", "argoproj.io/v1alpha0").unwrap();
        assert_eq!(dep.replacement, "argoproj.io/v1alpha1");
    }
}
