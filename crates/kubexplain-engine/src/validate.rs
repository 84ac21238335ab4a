//! Validation engine
//!
//! Three rule families run per resource, in order: required fields,
//! deprecated apiVersions, then the [consistency table](crate::consistency).
//! Issues come back in that order for each resource, resources in input
//! order. Only `error` issues make a report invalid.

use kubexplain_core::{FieldPath, Resource};
use serde::Serialize;
use std::fmt;

use crate::consistency::CONSISTENCY_RULES;
use crate::rules::RuleSet;

/// Issue severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
            Severity::Info => f.write_str("info"),
        }
    }
}

/// One validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    /// Stable id of the rule that raised it
    pub rule: &'static str,
    /// Display name of the offending resource
    pub resource: String,
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Issue {
    pub fn new(
        severity: Severity,
        rule: &'static str,
        resource: &Resource,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            rule,
            resource: resource.display_name(),
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Issue totals per severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IssueCounts {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

/// Result of validating a set of resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// No issue of severity `error`
    pub valid: bool,
    pub issues: Vec<Issue>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::from_issues(Vec::new())
    }
}

impl ValidationReport {
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        Self {
            valid: !issues.iter().any(Issue::is_error),
            issues,
        }
    }

    /// Append an issue, keeping `valid` in step
    pub fn push(&mut self, issue: Issue) {
        if issue.is_error() {
            self.valid = false;
        }
        self.issues.push(issue);
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.with_severity(Severity::Warning)
    }

    pub fn infos(&self) -> impl Iterator<Item = &Issue> {
        self.with_severity(Severity::Info)
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    pub fn counts(&self) -> IssueCounts {
        self.issues
            .iter()
            .fold(IssueCounts::default(), |mut counts, issue| {
                match issue.severity {
                    Severity::Error => counts.errors += 1,
                    Severity::Warning => counts.warnings += 1,
                    Severity::Info => counts.infos += 1,
                }
                counts
            })
    }

    /// Whether the report passes; `strict` also fails on warnings
    pub fn passes(&self, strict: bool) -> bool {
        self.valid && !(strict && self.warnings().next().is_some())
    }
}

/// Validator over a [`RuleSet`]
#[derive(Debug, Clone, Copy)]
pub struct Validator<'r> {
    rules: &'r RuleSet,
}

impl Default for Validator<'static> {
    fn default() -> Self {
        Self::new(RuleSet::builtin())
    }
}

impl<'r> Validator<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self { rules }
    }

    pub fn validate(&self, resources: &[Resource]) -> ValidationReport {
        let issues: Vec<Issue> = resources
            .iter()
            .flat_map(|resource| self.validate_resource(resource))
            .collect();

        let report = ValidationReport::from_issues(issues);
        tracing::debug!(
            resources = resources.len(),
            issues = report.issues.len(),
            valid = report.valid,
            "validated manifest"
        );
        report
    }

    /// Issues for one resource, families in order
    pub fn validate_resource(&self, resource: &Resource) -> Vec<Issue> {
        let mut issues = self.required_fields(resource);
        issues.extend(self.deprecated_api(resource));
        for rule in CONSISTENCY_RULES {
            issues.extend(rule.run(resource, self.rules));
        }
        issues
    }

    /// Missing required paths; a path under an already-missing one is skipped
    pub fn required_fields(&self, resource: &Resource) -> Vec<Issue> {
        let mut missing: Vec<&FieldPath> = Vec::new();
        let mut issues = Vec::new();

        for required in self.rules.required_paths(&resource.kind) {
            let path = required.path();
            if missing.iter().any(|m| path.is_under(m)) {
                continue;
            }

            let present = path
                .resolve(&resource.content)
                .is_some_and(|node| !node.is_null());
            if present {
                continue;
            }

            missing.push(path);
            let shown = path.to_string();
            let field = path.last_key().unwrap_or(&shown).to_string();
            issues.push(
                Issue::new(
                    Severity::Error,
                    "required-field",
                    resource,
                    shown.clone(),
                    format!("Missing required field '{}' in {}", shown, resource.kind),
                )
                .with_suggestion(field),
            );
        }
        issues
    }

    pub fn deprecated_api(&self, resource: &Resource) -> Option<Issue> {
        let deprecation = self
            .rules
            .deprecation(&resource.kind, &resource.api_version)?;

        let mut message = format!(
            "{} API version '{}' is deprecated",
            resource.kind, resource.api_version
        );
        if let Some(removed_in) = &deprecation.removed_in {
            message.push_str(&format!(" and removed in Kubernetes {}", removed_in));
        }

        Some(
            Issue::new(Severity::Warning, "deprecated-api", resource, "apiVersion", message)
                .with_suggestion(deprecation.replacement.clone()),
        )
    }
}

/// Validate with the built-in rules
pub fn validate(resources: &[Resource]) -> ValidationReport {
    Validator::default().validate(resources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubexplain_core::{extract_all, split};

    fn resources(raw: &str) -> Vec<Resource> {
        extract_all(&split(raw)).resources
    }

    #[test]
    fn test_deprecated_deployment() {
        let report = validate(&resources(
            "apiVersion: apps/v1beta1\nkind: Deployment\nmetadata:\n  name: d\nspec:\n  replicas: 2",
        ));
        assert!(!report.valid);

        let found: Vec<(Severity, &str, Option<&str>)> = report
            .issues
            .iter()
            .map(|i| (i.severity, i.path.as_str(), i.suggestion.as_deref()))
            .collect();
        assert_eq!(
            found,
            vec![
                (Severity::Error, "spec.selector", Some("selector")),
                (Severity::Error, "spec.template", Some("template")),
                (Severity::Warning, "apiVersion", Some("apps/v1")),
            ]
        );
        assert_eq!(
            report.issues[2].message,
            "Deployment API version 'apps/v1beta1' is deprecated and removed in Kubernetes 1.16"
        );
    }

    #[test]
    fn test_missing_ancestor_reported_once() {
        let report = validate(&resources(
            "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: d\n",
        ));
        let paths: Vec<&str> = report.issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["spec"]);
    }

    #[test]
    fn test_required_path_with_dotted_key() {
        let rules = RuleSet::builder()
            .without_builtin()
            .required(
                "ConfigMap",
                vec![r#"metadata.labels["app.kubernetes.io/name"]"#.into()],
            )
            .required("ConfigMap", vec!["data.items[1]".into()])
            .build()
            .unwrap();
        let validator = Validator::new(&rules);

        let labelled = &resources(
            r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: c
  labels:
    app.kubernetes.io/name: web
data:
  items: [a, b]
"#,
        )[0];
        assert!(validator.required_fields(labelled).is_empty());

        let unlabelled = &resources(
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  labels: {}\ndata:\n  items: [a]\n",
        )[0];
        let issues = validator.required_fields(unlabelled);
        let found: Vec<(&str, Option<&str>)> = issues
            .iter()
            .map(|i| (i.path.as_str(), i.suggestion.as_deref()))
            .collect();
        assert_eq!(
            found,
            vec![
                (
                    r#"metadata.labels["app.kubernetes.io/name"]"#,
                    Some("app.kubernetes.io/name")
                ),
                ("data.items[1]", Some("items")),
            ]
        );
        assert_eq!(
            issues[0].message,
            r#"Missing required field 'metadata.labels["app.kubernetes.io/name"]' in ConfigMap"#
        );
    }

    #[test]
    fn test_missing_dotted_key_ancestor_suppresses_descendants() {
        let rules = RuleSet::builder()
            .without_builtin()
            .required(
                "ConfigMap",
                vec![r#"data["app.conf"]"#.into(), r#"data["app.conf"].mode"#.into()],
            )
            .build()
            .unwrap();
        let resource =
            &resources("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: c\ndata: {}\n")[0];
        let issues = Validator::new(&rules).required_fields(resource);
        let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec![r#"data["app.conf"]"#]);
    }

    #[test]
    fn test_null_counts_as_missing() {
        let report = validate(&resources(
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: ~\n",
        ));
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].rule, "required-field");
        assert_eq!(report.issues[0].suggestion.as_deref(), Some("name"));
        assert_eq!(report.issues[0].resource, "ConfigMap/unnamed");
    }

    #[test]
    fn test_clean_pod_is_valid() {
        let report = validate(&resources(
            r#"
apiVersion: v1
kind: Pod
metadata:
  name: web
  namespace: shop
spec:
  containers:
  - name: web
    image: nginx:1.25
    resources:
      requests:
        cpu: 100m
"#,
        ));
        assert!(report.valid);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_warnings_and_infos_keep_report_valid() {
        let report = validate(&resources(
            "apiVersion: v1\nkind: Pod\nmetadata:\n  name: p\nspec:\n  containers:\n  - name: c\n    image: nginx:latest\n",
        ));
        assert!(report.valid);
        assert_eq!(
            report.counts(),
            IssueCounts {
                errors: 0,
                warnings: 0,
                infos: 2
            }
        );
        assert!(report.passes(true));
    }

    #[test]
    fn test_validity_monotonicity() {
        let resource = &resources("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: c\n")[0];
        let mut report = validate(std::slice::from_ref(resource));
        assert!(report.valid);

        report.push(Issue::new(Severity::Warning, "custom", resource, "data", "w"));
        report.push(Issue::new(Severity::Info, "custom", resource, "data", "i"));
        assert!(report.valid);
        assert!(!report.passes(true));

        report.push(Issue::new(Severity::Error, "custom", resource, "data", "e"));
        assert!(!report.valid);
        assert_eq!(report.errors().count(), 1);
    }

    #[test]
    fn test_empty_input_is_valid() {
        let report = validate(&[]);
        assert!(report.valid);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_issues_follow_resource_order() {
        let report = validate(&resources(
            r#"
apiVersion: extensions/v1beta1
kind: Ingress
metadata:
  name: old
spec:
  rules:
  - host: example.com
---
apiVersion: v1
kind: Secret
metadata: {}
"#,
        ));
        let found: Vec<(&str, &str)> = report
            .issues
            .iter()
            .map(|i| (i.resource.as_str(), i.rule))
            .collect();
        assert_eq!(
            found,
            vec![("Ingress/old", "deprecated-api"), ("Secret/unnamed", "required-field")]
        );
    }

    #[test]
    fn test_serialized_issue_shape() {
        let report = validate(&resources(
            "apiVersion: batch/v1beta1\nkind: CronJob\nmetadata:\n  name: c\n",
        ));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["issues"][0]["severity"], "error");
        assert_eq!(json["issues"][0]["path"], "spec");
        assert_eq!(json["issues"][1]["severity"], "warning");
        assert_eq!(json["issues"][1]["suggestion"], "batch/v1");
    }
}
