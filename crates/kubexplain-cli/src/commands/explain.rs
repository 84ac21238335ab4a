//! Explain command - attach explanations to every known field

use kubexplain_engine::{Explainer, prompt_context};
use std::path::Path;

use crate::commands::Context;
use crate::display;
use crate::error::{CliError, Result};
use crate::exit_codes;
use crate::input::Manifest;

pub fn run(
    ctx: &Context,
    file: &Path,
    narrative_file: Option<&Path>,
    show_prompt: bool,
) -> Result<i32> {
    let manifest = Manifest::load(file)?;
    let narrative = narrative_file
        .map(|path| {
            std::fs::read_to_string(path)
                .map_err(|err| CliError::io(path.display().to_string(), err))
        })
        .transpose()?;

    let report = Explainer::new(&ctx.rules)
        .explain(&manifest.extraction.resources, narrative.as_deref());

    if show_prompt {
        println!("{}", prompt_context(&report));
    } else if ctx.json {
        let output = manifest.with_problems(serde_json::json!({
            "source": manifest.source,
            "summary": report.summary,
            "details": report.details,
            "narrativeUsed": report.narrative_used(),
            "resources": report.resources,
            "explanations": report.entries().collect::<Vec<_>>(),
        }));
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        display::print_explanations(&report);
        if manifest.has_parse_errors() || !manifest.extraction.unrecognized.is_empty() {
            println!();
            display::print_document_problems(&manifest);
        }
    }

    Ok(if manifest.has_parse_errors() {
        exit_codes::INPUT_ERROR
    } else {
        exit_codes::SUCCESS
    })
}
