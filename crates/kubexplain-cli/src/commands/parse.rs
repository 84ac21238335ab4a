//! Parse command - split a manifest and list what was recognized

use console::style;
use std::path::Path;

use crate::commands::Context;
use crate::display;
use crate::error::Result;
use crate::exit_codes;
use crate::input::Manifest;

pub fn run(ctx: &Context, file: &Path) -> Result<i32> {
    let manifest = Manifest::load(file)?;
    let extraction = &manifest.extraction;

    if ctx.json {
        let resources: Vec<_> = extraction
            .resources
            .iter()
            .map(|r| {
                serde_json::json!({
                    "index": r.source_index,
                    "kind": r.kind,
                    "apiVersion": r.api_version,
                    "group": r.group(),
                    "version": r.version(),
                    "name": r.name,
                    "namespace": r.effective_namespace(),
                })
            })
            .collect();
        let output = manifest.with_problems(serde_json::json!({
            "source": manifest.source,
            "documents": manifest.split.segment_count(),
            "resources": resources,
        }));
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!(
            "{} {}: {} document(s), {} resource(s)",
            style("→").blue(),
            manifest.source,
            manifest.split.segment_count(),
            extraction.resources.len()
        );
        for resource in &extraction.resources {
            println!(
                "  {} [{}] {} {}",
                style("✓").green(),
                resource.source_index,
                resource.display_name(),
                style(format!("({})", resource.api_version)).dim()
            );
        }
        display::print_document_problems(&manifest);
    }

    Ok(if manifest.has_parse_errors() {
        exit_codes::INPUT_ERROR
    } else {
        exit_codes::SUCCESS
    })
}
