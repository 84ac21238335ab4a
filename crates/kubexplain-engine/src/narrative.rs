//! Prompt text for an external narrative writer
//!
//! The engine never calls a model itself. Callers that do can hand this text
//! to one and feed the answer back through
//! [`merge_external_narrative`](crate::explain::merge_external_narrative).

use crate::explain::{ExplainReport, Source};

/// Rule-based entries included in the prompt
pub const MAX_CONTEXT_ENTRIES: usize = 15;

const INSTRUCTIONS: &str = "Please provide a natural language explanation of this manifest, focusing on:
1. What this configuration does in practical terms
2. How the resources interact with each other
3. What happens when this is deployed to a cluster
4. Any best practices or potential issues to be aware of
Keep the explanation clear and accessible.";

/// Build the prompt describing a report's resources and key fields
pub fn prompt_context(report: &ExplainReport) -> String {
    let mut out = String::from("I have the following Kubernetes manifest:\n");

    for explained in &report.resources {
        let header = &explained.resource;
        out.push_str(&format!(
            "- {} named '{}'\n",
            header.kind,
            header.name.as_deref().unwrap_or("unnamed")
        ));
    }

    let entries: Vec<_> = report
        .entries()
        .filter(|e| e.source == Source::RuleBased)
        .take(MAX_CONTEXT_ENTRIES)
        .collect();
    if !entries.is_empty() {
        out.push_str("\nKey fields and their technical meanings:\n");
        for entry in entries {
            out.push_str(&format!("- {}: {}\n", entry.path, entry.explanation));
        }
    }

    out.push('\n');
    out.push_str(INSTRUCTIONS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explain::{explain_rule_based, merge_external_narrative};
    use kubexplain_core::{extract_all, split};

    #[test]
    fn test_prompt_lists_resources_and_fields() {
        let resources = extract_all(&split(
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: settings\ndata:\n  mode: fast\n",
        ))
        .resources;
        let prompt = prompt_context(&explain_rule_based(&resources));

        insta::assert_snapshot!(prompt, @r"
        I have the following Kubernetes manifest:
        - ConfigMap named 'settings'

        Key fields and their technical meanings:
        - apiVersion: The versioned schema of this object. Determines which API group and version the cluster uses to interpret the rest of the document.
        - kind: The type of Kubernetes object this document describes.
        - metadata: Contains metadata about the Kubernetes object, including its name, namespace, labels, and annotations.
        - metadata.name: The unique name of this resource within its namespace. Must be a valid DNS subdomain name.
        - data: Key-value pairs of configuration data. Each key is a filename or variable name, and each value is the content.

        Please provide a natural language explanation of this manifest, focusing on:
        1. What this configuration does in practical terms
        2. How the resources interact with each other
        3. What happens when this is deployed to a cluster
        4. Any best practices or potential issues to be aware of
        Keep the explanation clear and accessible.
        ");
    }

    #[test]
    fn test_prompt_caps_entries_and_skips_narrative() {
        let resources = extract_all(&split(
            r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  labels:
    app: web
spec:
  replicas: 3
  selector:
    matchLabels:
      app: web
  template:
    metadata:
      labels:
        app: web
    spec:
      containers:
      - name: web
        image: nginx:1.25
        ports:
        - containerPort: 80
"#,
        ))
        .resources;
        let report = merge_external_narrative(explain_rule_based(&resources), Some("narrated"));
        let prompt = prompt_context(&report);

        let field_lines = prompt
            .lines()
            .skip_while(|l| !l.starts_with("Key fields"))
            .skip(1)
            .take_while(|l| l.starts_with("- "))
            .count();
        assert_eq!(field_lines, MAX_CONTEXT_ENTRIES);
        assert!(!prompt.contains("narrated"));
    }

    #[test]
    fn test_prompt_for_empty_report() {
        let prompt = prompt_context(&ExplainReport::default());
        assert!(prompt.starts_with("I have the following Kubernetes manifest:\n\nPlease provide"));
    }
}
