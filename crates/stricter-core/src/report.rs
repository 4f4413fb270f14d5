//! Reporting of run results.
//!
//! The engine never prints on its own. A [`Reporter`] receives one line at a
//! time; [`console_lines`] renders an [`ApplicationResult`] into those lines.

use crate::types::ApplicationResult;
use std::sync::{Mutex, PoisonError};

/// Summary line for a run without error-level violations.
pub const NO_ERRORS: &str = "No errors";

/// Sink for report lines.
pub trait Reporter: Send + Sync {
    /// Emits one line.
    fn report(&self, line: &str);
}

/// Prints every line to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&self, line: &str) {
        println!("{line}");
    }
}

/// Keeps lines in memory, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    lines: Mutex<Vec<String>>,
}

impl MemoryReporter {
    /// Creates an empty reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines reported so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}

/// Summary line: `No errors`, or `<N> errors` counting error-level violations.
#[must_use]
pub fn summary_line(result: &ApplicationResult) -> String {
    match result.error_count() {
        0 => NO_ERRORS.to_string(),
        n => format!("{n} errors"),
    }
}

/// Console rendering: violations, then execution failures, then the summary.
#[must_use]
pub fn console_lines(result: &ApplicationResult) -> Vec<String> {
    result
        .violations()
        .map(ToString::to_string)
        .chain(result.failures.iter().map(ToString::to_string))
        .chain(std::iter::once(summary_line(result)))
        .collect()
}

/// Sends the console rendering of `result` to `reporter`.
pub fn report_result(reporter: &dyn Reporter, result: &ApplicationResult) {
    for line in console_lines(result) {
        reporter.report(&line);
    }
}
