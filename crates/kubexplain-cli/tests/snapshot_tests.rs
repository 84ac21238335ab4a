//! Snapshot tests for text output formatting

use std::process::Command;

/// Helper to run kubexplain and capture trimmed stdout
fn kubexplain_stdout(args: &[&str]) -> String {
    let output = Command::new(env!("CARGO_BIN_EXE_kubexplain"))
        .args(args)
        .env_remove("KUBEXPLAIN_CONFIG")
        .env_remove("CLICOLOR_FORCE")
        .env(
            "XDG_CONFIG_HOME",
            concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures/no-config"),
        )
        .output()
        .expect("Failed to execute kubexplain");

    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn fixture(name: &str) -> String {
    format!("{}/../../fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

#[test]
fn test_validate_deprecated_deployment_output() {
    let stdout = kubexplain_stdout(&["validate", &fixture("deprecated-deployment.yaml")]);
    insta::assert_snapshot!(stdout, @r"
    Deployment/d
      ✗ Missing required field 'spec.selector' in Deployment at spec.selector
        hint: selector
      ✗ Missing required field 'spec.template' in Deployment at spec.template
        hint: template
      ⚠ Deployment API version 'apps/v1beta1' is deprecated and removed in Kubernetes 1.16 at apiVersion
        hint: apps/v1

    ✗ Validation failed: 2 error(s), 1 warning(s), 0 info
    ");
}

#[test]
fn test_validate_strict_output() {
    let stdout = kubexplain_stdout(&["validate", &fixture("lb-service.yaml"), "--strict"]);
    insta::assert_snapshot!(stdout, @r"
    Service/edge
      ⚠ LoadBalancer Service 'edge' exposes no ports at spec.ports
        hint: Add at least one port in spec.ports

    ✗ Validation failed in strict mode: 1 warning(s)
    ");
}

#[test]
fn test_explain_narrative_output() {
    let stdout = kubexplain_stdout(&[
        "explain",
        &fixture("pod.yaml"),
        "--narrative-file",
        &fixture("narrative.txt"),
    ]);
    let summary: Vec<&str> = stdout.lines().take(2).collect();
    insta::assert_snapshot!(summary.join("\n"), @r"
    Summary
      This manifest runs a single nginx pod.
    ");
    assert!(stdout.ends_with("_llm_summary [llm]\n    This manifest runs a single nginx pod."));
}
