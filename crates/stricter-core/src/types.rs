//! Core types for violations, fixes and run results.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Level of a rule instance, stamped onto every violation it produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Reported, but not counted in the error summary.
    Warn,
    /// Reported and counted.
    #[default]
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Error returned by a failing fix action.
pub type FixError = Box<dyn std::error::Error + Send + Sync>;

/// A zero-argument, side-effecting action that resolves a violation.
///
/// Cloning a `Fix` shares the underlying action.
#[derive(Clone)]
pub struct Fix(Arc<dyn Fn() -> Result<(), FixError> + Send + Sync>);

impl Fix {
    /// Wraps a closure as a fix action.
    pub fn new<F>(action: F) -> Self
    where
        F: Fn() -> Result<(), FixError> + Send + Sync + 'static,
    {
        Self(Arc::new(action))
    }

    /// Runs the fix action.
    ///
    /// # Errors
    ///
    /// Returns whatever error the action reports.
    pub fn apply(&self) -> Result<(), FixError> {
        (self.0)()
    }
}

impl fmt::Debug for Fix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Fix(..)")
    }
}

/// A reported problem, tied to a rule instance and a file.
///
/// Rules build violations with [`Violation::new`]; the engine stamps the
/// qualified rule name and the instance level before collecting them.
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    /// Qualified rule name (e.g., `stricter/unused-files`).
    pub rule: String,
    /// Level of the rule instance that produced this violation.
    pub level: Level,
    /// File the violation is about.
    pub file: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Optional automatic fix.
    #[serde(skip)]
    pub fix: Option<Fix>,
}

impl Violation {
    /// Creates a new violation for `file`.
    #[must_use]
    pub fn new(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            rule: String::new(),
            level: Level::Error,
            file: file.into(),
            message: message.into(),
            fix: None,
        }
    }

    /// Attaches a fix action.
    #[must_use]
    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }

    /// Stamps the owning rule name and instance level.
    #[must_use]
    pub(crate) fn stamped(mut self, rule: &str, level: Level) -> Self {
        self.rule = rule.to_string();
        self.level = level;
        self
    }

    /// Formats the violation as a single console line.
    #[must_use]
    pub fn format(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {} {}",
            self.level,
            self.rule,
            self.file.display(),
            self.message
        )
    }
}

/// A rule instance whose hook failed instead of producing violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleFailure {
    /// Qualified rule name.
    pub rule: String,
    /// Zero-based index of the instance within the rule's configuration.
    pub instance: usize,
    /// Error or panic message.
    pub message: String,
}

impl fmt::Display for RuleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed: {} #{} {}", self.rule, self.instance, self.message)
    }
}

/// Violations and fixes collected for one rule name, across its instances.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RuleApplication {
    /// Violations in execution order.
    pub violations: Vec<Violation>,
    /// Fix actions of those violations, in the same order.
    #[serde(skip)]
    pub fixes: Vec<Fix>,
}

/// Aggregate output of one engine run, keyed by rule name in execution order.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ApplicationResult {
    /// Per-rule results.
    pub rules: IndexMap<String, RuleApplication>,
    /// Rule instances whose hook failed.
    pub failures: Vec<RuleFailure>,
}

impl ApplicationResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterates all violations in execution order.
    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.rules.values().flat_map(|r| r.violations.iter())
    }

    /// Counts violations as `(errors, warnings)`.
    #[must_use]
    pub fn count_by_level(&self) -> (usize, usize) {
        self.violations().fold((0, 0), |(errors, warnings), v| match v.level {
            Level::Error => (errors + 1, warnings),
            Level::Warn => (errors, warnings + 1),
        })
    }

    /// Number of error-level violations.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.count_by_level().0
    }

    /// Returns true if there are any error-level violations.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.violations().any(|v| v.level == Level::Error)
    }

    /// Returns true if any fix was collected.
    #[must_use]
    pub fn has_fixes(&self) -> bool {
        self.rules.values().any(|r| !r.fixes.is_empty())
    }

    /// Records violations for `rule`, keeping their order and collecting their fixes.
    pub(crate) fn push(&mut self, rule: &str, violations: Vec<Violation>) {
        let entry = self.rules.entry(rule.to_string()).or_default();
        for violation in violations {
            if let Some(fix) = &violation.fix {
                entry.fixes.push(fix.clone());
            }
            entry.violations.push(violation);
        }
    }
}
