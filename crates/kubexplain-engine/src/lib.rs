//! kubexplain engines - explaining and validating Kubernetes resources
//!
//! This crate provides:
//! - Path patterns with wildcard indices and deterministic precedence
//! - Built-in rule tables, with an optional YAML overlay
//! - A rule-based explainer that can merge an external narrative
//! - A validator combining required-field, deprecation and consistency rules

pub mod config;
pub mod consistency;
pub mod error;
pub mod explain;
pub mod narrative;
pub mod pattern;
pub mod rules;
pub mod suggestions;
pub mod validate;

pub use config::{RULES_API_VERSION, RulesConfig};
pub use error::{EngineError, Result};
pub use explain::{
    ExplainReport, ExplainedValue, Explainer, ExplanationEntry, NARRATIVE_PATH, ResourceExplanation,
    ResourceHeader, Source, explain_rule_based, merge_external_narrative,
};
pub use narrative::prompt_context;
pub use pattern::RulePattern;
pub use rules::{DeprecatedApi, RequiredPath, RuleSet, RuleSetBuilder};
pub use validate::{Issue, IssueCounts, Severity, ValidationReport, Validator, validate};
