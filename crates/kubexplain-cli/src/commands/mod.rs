//! CLI commands

pub mod explain;
pub mod parse;
pub mod validate;

use kubexplain_engine::{RuleSet, RulesConfig};
use std::path::Path;

use crate::error::Result;
use crate::settings::{OutputFormat, Settings};

/// Settings and flags resolved for one invocation
pub struct Context {
    pub json: bool,
    pub strict: bool,
    pub rules: RuleSet,
}

impl Context {
    /// Flags win over the settings file
    pub fn resolve(
        settings: Settings,
        json: bool,
        strict: bool,
        rules: Option<&Path>,
    ) -> Result<Self> {
        let rules_path = rules.map(Path::to_path_buf).or(settings.rules);
        let rules = match rules_path {
            Some(path) => {
                let config = RulesConfig::load_from(&path)?;
                RuleSet::builder().config(&config).build()?
            }
            None => RuleSet::builtin().clone(),
        };

        Ok(Self {
            json: json || settings.output == OutputFormat::Json,
            strict: strict || settings.strict,
            rules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_flags_override_settings() {
        let settings = Settings {
            output: OutputFormat::Json,
            ..Settings::default()
        };
        let ctx = Context::resolve(settings, false, true, None).unwrap();
        assert!(ctx.json);
        assert!(ctx.strict);
    }

    #[test]
    fn test_rules_flag_loads_overlay() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"apiVersion: kubexplain.io/v1\nkinds:\n  Rollout: Progressive delivery.\n")
            .unwrap();
        let ctx = Context::resolve(Settings::default(), false, false, Some(file.path())).unwrap();
        assert_eq!(ctx.rules.describe_kind("Rollout"), Some("Progressive delivery."));
        assert!(ctx.rules.describe_kind("Pod").is_some());
    }

    #[test]
    fn test_bad_overlay_pattern_fails() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"explanations:\n  - pattern: 'spec.'\n    text: broken\n")
            .unwrap();
        assert!(Context::resolve(Settings::default(), false, false, Some(file.path())).is_err());
    }
}
