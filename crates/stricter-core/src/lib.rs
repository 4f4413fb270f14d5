//! # stricter-core
//!
//! Project graph builder and rule evaluation engine.
//!
//! This crate provides the foundations of stricter:
//!
//! - [`GraphBuilder`] walks a source tree and records resolved import edges
//!   in a [`ProjectGraph`]
//! - [`Resolver`] maps import specifiers to files, backed by a shared
//!   [`ResolutionCache`]
//! - [`Rule`] is the capability every rule implements, looked up through a
//!   [`RuleRegistry`]
//! - [`Engine`] runs the configured rule instances and collects an
//!   [`ApplicationResult`]; [`apply_fixes`] runs the collected fixes
//!
//! ## Example
//!
//! ```ignore
//! use stricter_core::{engine, GraphBuilder, RuleRegistry, StricterConfig};
//!
//! let config = StricterConfig::from_file("stricter.toml".as_ref())?;
//! let graph = GraphBuilder::new(&config.root)
//!     .excludes(config.exclude.clone())
//!     .extractor(my_extractor)
//!     .build()?;
//!
//! let mapping = config.rules.resolve(&ctx);
//! let result = engine::run(&graph, &mapping, &registry)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
pub mod declarative;
pub mod engine;
mod extractor;
mod fix;
mod graph;
mod packages;
mod registry;
pub mod report;
mod resolver;
mod rule;
mod rules_config;
mod types;

pub use builder::{GraphBuilder, GraphError};
pub use config::{plugin_module_name, rule_mapping, ConfigError, StricterConfig, PLUGIN_PREFIX};
pub use engine::Engine;
pub use extractor::{ExtractorBox, ImportExtractor, ImportReference};
pub use fix::{apply_fixes, FixReport};
pub use graph::{FileNode, NodeId, PackageDescriptor, ProjectGraph};
pub use packages::{discover_packages, PackageError, ENTRY_FILES};
pub use registry::{Plugin, PluginCatalog, RuleRegistry, RuleTable};
pub use report::{ConsoleReporter, MemoryReporter, Reporter};
pub use resolver::{Resolution, ResolutionCache, Resolver, EXTENSIONS};
pub use rule::{rule_fn, FnRule, Rule, RuleContext, RuleError, RuleRef};
pub use rules_config::{
    ConfigContext, RuleInstanceConfig, RuleMapping, RuleTemplate, RulesDeclaration,
    PACKAGE_PLACEHOLDER,
};
pub use types::{
    ApplicationResult, Fix, FixError, Level, RuleApplication, RuleFailure, Violation,
};
