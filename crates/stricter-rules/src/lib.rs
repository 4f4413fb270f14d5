//! # stricter-rules
//!
//! Built-in rules for stricter, registered under the `stricter/` namespace.
//!
//! ## Available Rules
//!
//! | Name | Description |
//! |------|-------------|
//! | `stricter/unused-files` | Reports files not reachable from any entry point |
//! | `stricter/circular-dependencies` | Reports import cycles |
//!
//! ## Usage
//!
//! ```ignore
//! use stricter_core::RuleRegistry;
//!
//! let mut registry = RuleRegistry::new();
//! registry.register_table(stricter_rules::builtin_rules())?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod circular_dependencies;
mod unused_files;

pub use circular_dependencies::CircularDependencies;
pub use unused_files::UnusedFiles;

use std::sync::Arc;
use stricter_core::RuleTable;

/// Namespace of the built-in rules.
pub const NAMESPACE: &str = "stricter";

/// Qualified names of the built-in rules.
pub mod names {
    pub use crate::circular_dependencies::NAME as CIRCULAR_DEPENDENCIES;
    pub use crate::unused_files::NAME as UNUSED_FILES;
}

/// The built-in rule table.
#[must_use]
pub fn builtin_rules() -> RuleTable {
    let mut table = RuleTable::new();
    table.insert(names::UNUSED_FILES.to_string(), Arc::new(UnusedFiles::new()));
    table.insert(
        names::CIRCULAR_DEPENDENCIES.to_string(),
        Arc::new(CircularDependencies::new()),
    );
    table
}
