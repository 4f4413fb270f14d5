//! Default command: one lint run.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use stricter::{get_stricter, MemoryReporter, StricterOptions};

use crate::{CheckArgs, OutputFormat};

/// Runs the engine once. Returns whether the run failed.
pub fn run(project_dir: &Path, explicit: Option<&Path>, args: &CheckArgs) -> Result<bool> {
    let config = super::config_path(project_dir, explicit)?;
    tracing::debug!("Using config: {}", config.display());

    let mut options = StricterOptions::from_path(&config)
        .clear_cache(args.clear_cache)
        .fix(args.fix);
    if !args.rule_names.is_empty() {
        options = options.rules_to_verify(args.rule_names.iter().cloned());
    }

    let lines = Arc::new(MemoryReporter::new());
    if args.format == OutputFormat::Json {
        options = options.reporter(lines.clone());
    }

    let run = get_stricter(options);
    let outcome = run().with_context(|| format!("Run failed for {}", config.display()))?;

    super::output::print(&outcome, &lines.lines(), args.format, args.fix)?;
    Ok(outcome.is_failure())
}
