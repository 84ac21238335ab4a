//! Display formatting for CLI output
//!
//! Provides structured display for:
//! - Parse errors and unrecognized documents
//! - Explanations with their source badge
//! - Validation issues grouped by resource

use console::style;
use kubexplain_engine::{ExplainReport, ExplanationEntry, Issue, Severity, Source, ValidationReport};

use crate::input::Manifest;

/// Print parse errors and unrecognized documents, if any
pub fn print_document_problems(manifest: &Manifest) {
    for error in &manifest.split.errors {
        println!("  {} {}", style("✗").red(), error);
    }
    for marker in &manifest.extraction.unrecognized {
        println!(
            "  {} document {} skipped: {}",
            style("⚠").yellow(),
            marker.index,
            marker.reason
        );
    }
}

/// Print the summary and every explained field
pub fn print_explanations(report: &ExplainReport) {
    if report.is_empty() {
        println!("{} No resources to explain", style("⚠").yellow());
        return;
    }

    println!("{}", style("Summary").bold());
    for line in report.summary.lines() {
        println!("  {}", line);
    }

    for explained in &report.resources {
        let header = &explained.resource;
        println!();
        println!(
            "{} {}",
            style(format!(
                "{}/{}",
                header.kind,
                header.name.as_deref().unwrap_or("unnamed")
            ))
            .cyan()
            .bold(),
            style(format!("({})", header.api_version)).dim()
        );
        for entry in &explained.entries {
            print_entry(entry);
        }
    }

    if let Some(narrative) = &report.narrative {
        println!();
        println!("{}", style("Rule-based details").bold());
        for line in report.details.lines() {
            println!("  {}", line);
        }
        println!();
        print_entry(narrative);
    }
}

fn print_entry(entry: &ExplanationEntry) {
    let badge = match entry.source {
        Source::RuleBased => style("rule").dim(),
        Source::Llm => style("llm").magenta(),
    };
    let value = entry.value.to_string();
    if value.is_empty() {
        println!("  {} [{}]", style(&entry.path).green(), badge);
    } else {
        println!(
            "  {} = {} [{}]",
            style(&entry.path).green(),
            value,
            badge
        );
    }
    println!("    {}", entry.explanation);
}

fn severity_icon(severity: Severity) -> console::StyledObject<&'static str> {
    match severity {
        Severity::Error => style("✗").red(),
        Severity::Warning => style("⚠").yellow(),
        Severity::Info => style("ℹ").blue(),
    }
}

/// Print issues grouped by resource, in report order
pub fn print_issues(report: &ValidationReport) {
    let mut current: Option<&str> = None;
    for issue in &report.issues {
        if current != Some(issue.resource.as_str()) {
            println!();
            println!("{}", style(&issue.resource).cyan().bold());
            current = Some(issue.resource.as_str());
        }
        print_issue(issue);
    }
}

fn print_issue(issue: &Issue) {
    let path_display = if issue.path.is_empty() {
        String::new()
    } else {
        format!(" at {}", style(&issue.path).dim())
    };
    println!(
        "  {} {}{}",
        severity_icon(issue.severity),
        issue.message,
        path_display
    );
    if let Some(suggestion) = &issue.suggestion {
        println!("    {} {}", style("hint:").blue(), suggestion);
    }
}

/// Print the verdict line
pub fn print_validation_summary(report: &ValidationReport, strict: bool) {
    let counts = report.counts();
    if !report.valid {
        println!(
            "{} Validation failed: {} error(s), {} warning(s), {} info",
            style("✗").red().bold(),
            counts.errors,
            counts.warnings,
            counts.infos
        );
    } else if counts.warnings > 0 && strict {
        println!(
            "{} Validation failed in strict mode: {} warning(s)",
            style("✗").red().bold(),
            counts.warnings
        );
    } else if counts.warnings > 0 {
        println!(
            "{} Validation passed with {} warning(s)",
            style("⚠").yellow().bold(),
            counts.warnings
        );
    } else {
        println!("{} Validation passed!", style("✓").green().bold());
    }
}
