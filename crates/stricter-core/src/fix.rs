//! Fix processor.

use crate::engine::panic_message;
use crate::types::ApplicationResult;

use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, error};

/// Summary of a fix pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FixReport {
    /// Fix actions that completed.
    pub applied: usize,
    /// Rules whose fix sequence stopped on a failing action.
    pub failed_rules: Vec<String>,
}

/// Applies every collected fix, rule by rule.
///
/// Within a rule, fixes run in order and stop at the first failure; fixes
/// that already ran stay applied. A failure never affects other rules.
pub fn apply_fixes(result: &ApplicationResult) -> FixReport {
    let mut report = FixReport::default();

    for (rule, application) in result.rules.iter().filter(|(_, a)| !a.fixes.is_empty()) {
        debug!("Applying {} fix(es) for {rule}", application.fixes.len());
        for fix in &application.fixes {
            let message = match catch_unwind(AssertUnwindSafe(|| fix.apply())) {
                Ok(Ok(())) => {
                    report.applied += 1;
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
            };
            error!("Failed to apply fixes for {rule}: {message}");
            report.failed_rules.push(rule.clone());
            break;
        }
    }

    report
}
