//! List rules command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use stricter::{RuleRegistry, Stricter, StricterOptions};

use crate::config_resolver;

/// Lists built-in rules, plus directory and plugin rules when a
/// configuration is available.
pub fn run(project_dir: &Path, explicit: Option<&Path>) -> Result<()> {
    let registry = match config_resolver::resolve(project_dir, explicit).path() {
        Some(path) => {
            let stricter = Stricter::new(StricterOptions::from_path(path));
            let config = stricter
                .load_config()
                .with_context(|| format!("Failed to load config: {}", path.display()))?;
            stricter.registry(&config)?
        }
        None => {
            let mut registry = RuleRegistry::new();
            registry.register_table(stricter::rules::builtin_rules())?;
            registry
        }
    };

    println!("Available rules:\n");
    for line in rule_lines(&registry) {
        println!("{line}");
    }
    println!("\nUse --rule-name to run a subset, e.g.:");
    println!("  stricter --rule-name stricter/unused-files");
    Ok(())
}

fn rule_lines(registry: &RuleRegistry) -> Vec<String> {
    let width = registry.names().map(str::len).max().unwrap_or(0);
    registry
        .iter()
        .map(|(name, rule)| format!("{name:<width$}  {}", rule.description()))
        .collect()
}
