//! Explanation engine
//!
//! Every path of every resource is matched against the rule table; matched
//! paths become [`ExplanationEntry`] values, unmatched paths are skipped.
//! A narrative produced elsewhere (a language model, a human) can be merged
//! into a finished report with [`merge_external_narrative`].

use kubexplain_core::{Resource, Scalar, TreeNode};
use serde::{Serialize, Serializer};
use std::fmt;

use crate::rules::RuleSet;

/// Reserved path of the narrative entry
pub const NARRATIVE_PATH: &str = "_llm_summary";

/// Where an explanation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    RuleBased,
    Llm,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::RuleBased => f.write_str("rule-based"),
            Source::Llm => f.write_str("llm"),
        }
    }
}

/// The value shown next to an explanation
///
/// Scalars are kept as parsed; containers are reduced to their shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ExplainedValue {
    Scalar(Scalar),
    Mapping { len: usize },
    Sequence { len: usize },
    /// Narrative entries carry no value
    None,
}

impl ExplainedValue {
    pub fn from_node(node: &TreeNode) -> Self {
        match node {
            TreeNode::Scalar(scalar) => ExplainedValue::Scalar(scalar.clone()),
            TreeNode::Mapping(entries) => ExplainedValue::Mapping { len: entries.len() },
            TreeNode::Sequence(items) => ExplainedValue::Sequence { len: items.len() },
        }
    }
}

impl fmt::Display for ExplainedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExplainedValue::Scalar(scalar) => write!(f, "{}", scalar),
            ExplainedValue::Mapping { len } => write!(f, "<mapping> ({} keys)", len),
            ExplainedValue::Sequence { len } => write!(f, "<sequence> ({} items)", len),
            ExplainedValue::None => Ok(()),
        }
    }
}

impl Serialize for ExplainedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ExplainedValue::Scalar(scalar) => scalar.serialize(serializer),
            ExplainedValue::None => serializer.serialize_str(""),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

/// One explained field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplanationEntry {
    pub path: String,
    pub value: ExplainedValue,
    pub explanation: String,
    pub source: Source,
    /// Rule pattern that produced the explanation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// Identity of an explained resource
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceHeader {
    pub kind: String,
    pub api_version: String,
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub source_index: usize,
}

impl From<&Resource> for ResourceHeader {
    fn from(resource: &Resource) -> Self {
        Self {
            kind: resource.kind.clone(),
            api_version: resource.api_version.clone(),
            name: resource.name.clone(),
            namespace: resource.namespace.clone(),
            source_index: resource.source_index,
        }
    }
}

/// Explanations for one resource
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceExplanation {
    pub resource: ResourceHeader,
    /// Kind description, or the generic fallback
    pub description: String,
    pub entries: Vec<ExplanationEntry>,
}

/// Result of explaining a set of resources
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExplainReport {
    pub resources: Vec<ResourceExplanation>,
    /// Narrative when one was merged, otherwise the rule-based summary
    pub summary: String,
    /// Rule-based summary, always present
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<ExplanationEntry>,
}

impl ExplainReport {
    /// All entries in resource order, the narrative entry last
    pub fn entries(&self) -> impl Iterator<Item = &ExplanationEntry> {
        self.resources
            .iter()
            .flat_map(|r| r.entries.iter())
            .chain(self.narrative.iter())
    }

    pub fn narrative_used(&self) -> bool {
        self.narrative.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Rule-based explainer over a [`RuleSet`]
#[derive(Debug, Clone, Copy)]
pub struct Explainer<'r> {
    rules: &'r RuleSet,
}

impl Default for Explainer<'static> {
    fn default() -> Self {
        Self::new(RuleSet::builtin())
    }
}

impl<'r> Explainer<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self { rules }
    }

    /// Explain resources and blend in an optional narrative
    pub fn explain(&self, resources: &[Resource], narrative: Option<&str>) -> ExplainReport {
        merge_external_narrative(self.explain_rule_based(resources), narrative)
    }

    /// Explain resources using only the rule table
    pub fn explain_rule_based(&self, resources: &[Resource]) -> ExplainReport {
        let explained: Vec<ResourceExplanation> = resources
            .iter()
            .map(|resource| self.explain_resource(resource))
            .collect();

        let summary = summarize(&explained);
        tracing::debug!(
            resources = explained.len(),
            entries = explained.iter().map(|r| r.entries.len()).sum::<usize>(),
            "explained manifest"
        );

        ExplainReport {
            resources: explained,
            details: summary.clone(),
            summary,
            narrative: None,
        }
    }

    pub fn explain_resource(&self, resource: &Resource) -> ResourceExplanation {
        let entries = resource
            .paths()
            .filter_map(|entry| {
                let rule = self.rules.explain_path(&entry.path)?;
                Some(ExplanationEntry {
                    path: entry.path.to_string(),
                    value: ExplainedValue::from_node(entry.value),
                    explanation: rule.text.clone(),
                    source: Source::RuleBased,
                    pattern: Some(rule.pattern.to_string()),
                })
            })
            .collect();

        ResourceExplanation {
            resource: ResourceHeader::from(resource),
            description: self.describe(&resource.kind),
            entries,
        }
    }

    fn describe(&self, kind: &str) -> String {
        match self.rules.describe_kind(kind) {
            Some(text) => text.to_string(),
            None => format!("Kubernetes resource of kind {}.", kind),
        }
    }
}

/// Explain with the built-in rules only
pub fn explain_rule_based(resources: &[Resource]) -> ExplainReport {
    Explainer::default().explain_rule_based(resources)
}

/// Attach an externally produced narrative to a finished report
///
/// A blank or absent narrative leaves the report untouched. Otherwise the
/// narrative becomes the summary and a `source = llm` entry at
/// [`NARRATIVE_PATH`]; `details` keeps the rule-based summary.
pub fn merge_external_narrative(
    mut report: ExplainReport,
    narrative: Option<&str>,
) -> ExplainReport {
    let Some(text) = narrative.map(str::trim).filter(|t| !t.is_empty()) else {
        return report;
    };

    report.summary = text.to_string();
    report.narrative = Some(ExplanationEntry {
        path: NARRATIVE_PATH.to_string(),
        value: ExplainedValue::None,
        explanation: text.to_string(),
        source: Source::Llm,
        pattern: None,
    });
    report
}

/// One sentence for one resource
pub fn resource_sentence(explained: &ResourceExplanation) -> String {
    let header = &explained.resource;
    let mut sentence = header.kind.clone();
    if let Some(name) = &header.name {
        sentence.push_str(&format!(" '{}'", name));
    }
    if let Some(namespace) = &header.namespace {
        sentence.push_str(&format!(" in namespace '{}'", namespace));
    }
    format!("{}: {}", sentence, explained.description)
}

fn summarize(explained: &[ResourceExplanation]) -> String {
    match explained {
        [] => String::new(),
        [single] => resource_sentence(single),
        many => {
            let mut lines = vec![format!("This manifest contains {} resources.", many.len())];
            lines.extend(
                many.iter()
                    .enumerate()
                    .map(|(i, r)| format!("{}. {}", i + 1, resource_sentence(r))),
            );
            lines.join("\n")
        }
    }
}
