//! # stricter
//!
//! Project dependency graph builder and rule engine for JavaScript and
//! TypeScript codebases.
//!
//! This is the facade crate: it re-exports the core, the built-in rules and
//! the import extractors, and provides the engine entry point.
//!
//! ## Quick Start
//!
//! ```toml
//! # stricter.toml
//! root = "src"
//! exclude = ['.*\.json']
//!
//! [[rules."stricter/unused-files"]]
//! level = "error"
//! config = { entry = ['/src/index\.js'] }
//! ```
//!
//! ```rust,ignore
//! use stricter::{get_stricter, StricterOptions};
//!
//! let run = get_stricter(StricterOptions::from_path("stricter.toml"));
//! let outcome = run()?;
//! assert_eq!(outcome.error_count, 0);
//! ```
//!
//! ## Rules as a function of the project
//!
//! Mark an instance `for-each-package = true` and it is repeated for every
//! discovered package, with `{package}` substituted in its config:
//!
//! ```toml
//! [[rules."stricter/unused-files"]]
//! for-each-package = true
//! config = { entry = ['{package}/index\.js'] }
//! ```
//!
//! Programmatic callers can pass any closure instead:
//!
//! ```rust,ignore
//! use stricter::{RulesDeclaration, RuleInstanceConfig, RuleMapping};
//!
//! let rules = RulesDeclaration::dynamic(|ctx| {
//!     let mut mapping = RuleMapping::new();
//!     mapping.insert(
//!         "stricter/unused-files".into(),
//!         ctx.packages.iter().map(|pkg| entry_for(pkg)).collect(),
//!     );
//!     mapping
//! });
//! ```

#![forbid(unsafe_code)]

pub use stricter_core::*;

/// Built-in rules.
pub mod rules {
    pub use stricter_rules::*;
}

/// Import extractors.
pub mod js {
    pub use stricter_js::*;
}

mod factory;

pub use factory::{
    get_stricter, ConfigSource, RunOutcome, Stricter, StricterError, StricterOptions,
};
