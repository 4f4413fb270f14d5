//! Rule reporting files that no entry point reaches.
//!
//! # Configuration
//!
//! - `entry`: regular expressions selecting entry files (required)
//! - `relatedEntry`: regular expressions selecting files that count as used
//!   on their own, such as tests or stories, along with their dependencies
//!
//! Patterns are unanchored and matched against the full file path.
//!
//! ```toml
//! [[rules."stricter/unused-files"]]
//! level = "error"
//! config = { entry = ['/src/index\.js'], relatedEntry = ['\.test\.js$'] }
//! ```

use regex::Regex;
use std::collections::VecDeque;
use stricter_core::{NodeId, ProjectGraph, Rule, RuleContext, RuleError, Violation};
use tracing::debug;

/// Rule name for unused-files.
pub const NAME: &str = "stricter/unused-files";

/// Message attached to every unused file.
pub const MESSAGE: &str = "Unused file";

/// Reports walked files unreachable from any entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnusedFiles;

impl UnusedFiles {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for UnusedFiles {
    fn description(&self) -> &str {
        "Reports files that are not reachable from any entry point"
    }

    fn on_project(&self, ctx: &RuleContext<'_>) -> Result<Vec<Violation>, RuleError> {
        let entry = ctx.get_regex_array("entry")?;
        if entry.is_empty() {
            return Err(RuleError::InvalidOption {
                key: "entry".into(),
                message: "at least one entry pattern is required".into(),
            });
        }
        let related = ctx.get_regex_array("relatedEntry")?;

        let roots: Vec<NodeId> = ctx
            .graph
            .files()
            .filter(|n| {
                let path = n.path().to_string_lossy();
                matches_any(&entry, &path) || matches_any(&related, &path)
            })
            .map(|n| n.id())
            .collect();
        debug!("{} entry file(s)", roots.len());

        let reached = reachable(ctx.graph, &roots);
        Ok(ctx
            .graph
            .files()
            .filter(|n| !reached[n.id()])
            .map(|n| Violation::new(n.path(), MESSAGE))
            .collect())
    }
}

fn matches_any(patterns: &[Regex], path: &str) -> bool {
    patterns.iter().any(|re| re.is_match(path))
}

/// Marks every node reachable from `roots`, indexed by node id.
fn reachable(graph: &ProjectGraph, roots: &[NodeId]) -> Vec<bool> {
    let mut seen = vec![false; graph.len()];
    let mut queue: VecDeque<NodeId> = VecDeque::new();

    for &root in roots {
        if !seen[root] {
            seen[root] = true;
            queue.push_back(root);
        }
    }

    while let Some(id) = queue.pop_front() {
        let Some(node) = graph.get(id) else {
            continue;
        };
        for &dep in node.dependency_ids() {
            if !seen[dep] {
                seen[dep] = true;
                queue.push_back(dep);
            }
        }
    }
    seen
}
