//! Output of a finished run.

use anyhow::Result;
use serde::Serialize;
use stricter::RunOutcome;

use crate::OutputFormat;

#[derive(Serialize)]
struct JsonReport<'a> {
    lines: &'a [String],
    #[serde(flatten)]
    outcome: &'a RunOutcome,
}

/// Prints what the reporter did not already print.
pub fn print(outcome: &RunOutcome, lines: &[String], format: OutputFormat, fix: bool) -> Result<()> {
    match format {
        OutputFormat::Text => {
            if fix {
                print_fix_summary(outcome);
            }
            Ok(())
        }
        OutputFormat::Json => print_json(outcome, lines),
    }
}

fn print_fix_summary(outcome: &RunOutcome) {
    println!("Applied {} fix(es)", outcome.fixes_applied);
    for rule in &outcome.fix_failures {
        println!("Fixes failed for {rule}");
    }
}

fn print_json(outcome: &RunOutcome, lines: &[String]) -> Result<()> {
    let json = serde_json::to_string_pretty(&JsonReport { lines, outcome })?;
    println!("{json}");
    Ok(())
}
