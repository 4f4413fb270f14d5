//! Resolution of the `rules` declaration into concrete rule instances.
//!
//! A declaration is either a static mapping or a function of the project
//! context. Functions run exactly once per run, with nothing memoized across
//! runs, so each run sees its own discovered packages.

use crate::config::empty_table;
use crate::types::Level;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Placeholder replaced by the package name in per-package instances.
pub const PACKAGE_PLACEHOLDER: &str = "{package}";

/// One configured activation of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleInstanceConfig {
    /// Level stamped onto this instance's violations.
    #[serde(default)]
    pub level: Level,
    /// Rule-specific options.
    #[serde(default = "empty_table")]
    pub config: toml::Value,
}

impl RuleInstanceConfig {
    /// Creates an instance with no options.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self {
            level,
            config: empty_table(),
        }
    }

    /// Error-level instance with no options.
    #[must_use]
    pub fn error() -> Self {
        Self::new(Level::Error)
    }

    /// Warn-level instance with no options.
    #[must_use]
    pub fn warn() -> Self {
        Self::new(Level::Warn)
    }

    /// Sets the rule-specific options.
    #[must_use]
    pub fn with_config(mut self, config: toml::Value) -> Self {
        self.config = config;
        self
    }
}

/// Rule name to its instances, in declaration order.
pub type RuleMapping = IndexMap<String, Vec<RuleInstanceConfig>>;

/// Snapshot of the project shape passed to dynamic declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigContext {
    /// Discovered package names.
    pub packages: Vec<String>,
    /// Analysis root.
    pub root: PathBuf,
}

type RulesFn = dyn Fn(&ConfigContext) -> RuleMapping + Send + Sync;

/// The user's `rules` declaration.
#[derive(Clone)]
pub enum RulesDeclaration {
    /// A fixed mapping.
    Static(RuleMapping),
    /// A pure function of the project context.
    Dynamic(Arc<RulesFn>),
}

impl Default for RulesDeclaration {
    fn default() -> Self {
        Self::Static(RuleMapping::new())
    }
}

impl fmt::Debug for RulesDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(mapping) => f.debug_tuple("Static").field(mapping).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<RuleMapping> for RulesDeclaration {
    fn from(mapping: RuleMapping) -> Self {
        Self::Static(mapping)
    }
}

impl RulesDeclaration {
    /// Wraps a function of the project context.
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&ConfigContext) -> RuleMapping + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    /// Resolves the declaration against `ctx`.
    #[must_use]
    pub fn resolve(&self, ctx: &ConfigContext) -> RuleMapping {
        match self {
            Self::Static(mapping) => mapping.clone(),
            Self::Dynamic(f) => f(ctx),
        }
    }

    /// Builds a declaration from file-level templates.
    ///
    /// Stays static unless an instance is marked `for-each-package`, in
    /// which case resolution expands that instance once per package.
    #[must_use]
    pub fn from_templates(templates: IndexMap<String, Vec<RuleTemplate>>) -> Self {
        let dynamic = templates
            .values()
            .flatten()
            .any(|t| t.for_each_package);

        if !dynamic {
            return Self::Static(
                templates
                    .into_iter()
                    .map(|(name, instances)| {
                        (name, instances.into_iter().map(|t| t.instance).collect())
                    })
                    .collect(),
            );
        }

        Self::dynamic(move |ctx| expand_templates(&templates, ctx))
    }
}

/// A configured instance as written in the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTemplate {
    /// The instance, possibly containing `{package}` placeholders.
    pub instance: RuleInstanceConfig,
    /// Expand once per discovered package.
    pub for_each_package: bool,
}

fn expand_templates(
    templates: &IndexMap<String, Vec<RuleTemplate>>,
    ctx: &ConfigContext,
) -> RuleMapping {
    templates
        .iter()
        .map(|(name, instances)| {
            let expanded = instances
                .iter()
                .flat_map(|t| {
                    if t.for_each_package {
                        ctx.packages
                            .iter()
                            .map(|pkg| RuleInstanceConfig {
                                level: t.instance.level,
                                config: substitute(&t.instance.config, pkg),
                            })
                            .collect()
                    } else {
                        vec![t.instance.clone()]
                    }
                })
                .collect();
            (name.clone(), expanded)
        })
        .collect()
}

fn substitute(value: &toml::Value, package: &str) -> toml::Value {
    match value {
        toml::Value::String(s) => toml::Value::String(s.replace(PACKAGE_PLACEHOLDER, package)),
        toml::Value::Array(items) => {
            toml::Value::Array(items.iter().map(|v| substitute(v, package)).collect())
        }
        toml::Value::Table(table) => toml::Value::Table(
            table
                .iter()
                .map(|(k, v)| (k.clone(), substitute(v, package)))
                .collect(),
        ),
        other => other.clone(),
    }
}
