//! Rules defined as TOML files in a rules directory.
//!
//! Each `*.toml` file defines one rule, registered under the file stem:
//!
//! ```toml
//! description = "UI code stays out of the data layer"
//!
//! [[deny]]
//! from = '/data/'
//! to = '/ui/'
//! message = "data must not import ui"
//! ```
//!
//! A `deny` entry reports every walked file matching `from` that depends on a
//! file matching `to`. Both patterns are unanchored regular expressions over
//! the full path string.

use crate::config::ConfigError;
use crate::registry::RuleTable;
use crate::rule::{Rule, RuleContext, RuleError};
use crate::types::Violation;

use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Extension of rule definition files.
pub const RULE_FILE_EXTENSION: &str = "toml";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleFileDto {
    #[serde(default)]
    description: String,
    #[serde(default)]
    deny: Vec<DenyDto>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DenyDto {
    from: String,
    to: String,
    #[serde(default)]
    message: Option<String>,
}

/// A forbidden dependency direction.
#[derive(Debug, Clone)]
pub struct DenyEdge {
    from: Regex,
    to: Regex,
    message: String,
}

impl DenyEdge {
    /// Creates a constraint; the message defaults to a description of the edge.
    #[must_use]
    pub fn new(from: Regex, to: Regex, message: Option<String>) -> Self {
        let message =
            message.unwrap_or_else(|| format!("Forbidden dependency: {from} -> {to}"));
        Self { from, to, message }
    }
}

/// Rule built from a rule definition file.
#[derive(Debug, Clone)]
pub struct DeclarativeRule {
    description: String,
    deny: Vec<DenyEdge>,
}

impl DeclarativeRule {
    /// Creates a rule from its constraints.
    #[must_use]
    pub fn new(description: impl Into<String>, deny: Vec<DenyEdge>) -> Self {
        Self {
            description: description.into(),
            deny,
        }
    }
}

impl Rule for DeclarativeRule {
    fn description(&self) -> &str {
        &self.description
    }

    fn on_project(&self, ctx: &RuleContext<'_>) -> Result<Vec<Violation>, RuleError> {
        let mut violations = Vec::new();

        for node in ctx.graph.files() {
            let from = node.path().to_string_lossy();
            for edge in self.deny.iter().filter(|d| d.from.is_match(&from)) {
                for dep in ctx.graph.dependencies(node) {
                    if edge.to.is_match(&dep.path().to_string_lossy()) {
                        violations.push(Violation::new(
                            node.path(),
                            format!("{} ({})", edge.message, dep.path().display()),
                        ));
                    }
                }
            }
        }

        Ok(violations)
    }
}

/// Loads every rule definition file in `dir`, keyed by file stem.
///
/// Files with other extensions are ignored. Rules are returned in file name
/// order.
///
/// # Errors
///
/// Returns an error if `dir` is not a directory or a rule file is invalid.
pub fn load_rules_dir(dir: &Path) -> Result<RuleTable, ConfigError> {
    if !dir.is_dir() {
        return Err(ConfigError::RulesDirNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|source| ConfigError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == RULE_FILE_EXTENSION))
        .collect();
    files.sort();

    let mut table = RuleTable::new();
    for path in files {
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let rule = load_rule_file(&path)?;
        debug!("Loaded rule `{name}` from {}", path.display());
        table.insert(name.to_string(), Arc::new(rule));
    }
    Ok(table)
}

/// Parses a single rule definition file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid definition.
pub fn load_rule_file(path: &Path) -> Result<DeclarativeRule, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_rule(&content).map_err(|message| ConfigError::InvalidRuleFile {
        path: path.to_path_buf(),
        message,
    })
}

fn parse_rule(content: &str) -> Result<DeclarativeRule, String> {
    let dto: RuleFileDto = toml::from_str(content).map_err(|e| e.to_string())?;
    let deny = dto
        .deny
        .into_iter()
        .enumerate()
        .map(|(i, d)| {
            let compile = |field: &str, pattern: &str| {
                Regex::new(pattern).map_err(|e| format!("deny[{i}].{field}: {e}"))
            };
            Ok(DenyEdge::new(
                compile("from", &d.from)?,
                compile("to", &d.to)?,
                d.message,
            ))
        })
        .collect::<Result<Vec<_>, String>>()?;
    Ok(DeclarativeRule::new(dto.description, deny))
}
