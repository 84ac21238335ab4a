//! Validate command - required fields, deprecated APIs and consistency checks

use kubexplain_engine::Validator;
use std::path::Path;

use crate::commands::Context;
use crate::display;
use crate::error::Result;
use crate::exit_codes;
use crate::input::Manifest;

pub fn run(ctx: &Context, file: &Path) -> Result<i32> {
    let manifest = Manifest::load(file)?;
    let report = Validator::new(&ctx.rules).validate(&manifest.extraction.resources);
    let passed = report.passes(ctx.strict);

    if ctx.json {
        let output = manifest.with_problems(serde_json::json!({
            "source": manifest.source,
            "valid": report.valid,
            "passed": passed,
            "strict": ctx.strict,
            "counts": report.counts(),
            "issues": report.issues,
        }));
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        display::print_issues(&report);
        if manifest.has_parse_errors() || !manifest.extraction.unrecognized.is_empty() {
            println!();
            display::print_document_problems(&manifest);
        }
        println!();
        display::print_validation_summary(&report, ctx.strict);
    }

    Ok(if !passed {
        exit_codes::VALIDATION_ERROR
    } else if manifest.has_parse_errors() {
        exit_codes::INPUT_ERROR
    } else {
        exit_codes::SUCCESS
    })
}
