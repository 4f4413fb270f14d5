//! Rule lookup: built-ins, rules directories and plugins.

use crate::config::{plugin_module_name, ConfigError};
use crate::declarative::load_rules_dir;
use crate::rule::RuleRef;

use indexmap::IndexMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Rule name to definition, in registration order.
pub type RuleTable = IndexMap<String, RuleRef>;

/// A bundle of rules contributed under a plugin namespace.
///
/// Each rule is registered as `<plugin>/<rule>`, where `<plugin>` is the
/// name suffix used in the config's `plugins` list.
pub trait Plugin: Send + Sync {
    /// Rules provided by this plugin, keyed by unqualified name.
    fn rules(&self) -> RuleTable;
}

impl<F> Plugin for F
where
    F: Fn() -> RuleTable + Send + Sync,
{
    fn rules(&self) -> RuleTable {
        self()
    }
}

/// Plugins available to a run, keyed by module name (`stricter-plugin-<name>`).
#[derive(Clone, Default)]
pub struct PluginCatalog {
    plugins: IndexMap<String, Arc<dyn Plugin>>,
}

impl std::fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.plugins.keys()).finish()
    }
}

impl PluginCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes a plugin available under its full module name.
    #[must_use]
    pub fn with(mut self, module: impl Into<String>, plugin: impl Plugin + 'static) -> Self {
        self.register(module, plugin);
        self
    }

    /// Makes a plugin available under its full module name.
    pub fn register(&mut self, module: impl Into<String>, plugin: impl Plugin + 'static) {
        self.plugins.insert(module.into(), Arc::new(plugin));
    }

    /// Looks up a plugin by module name.
    #[must_use]
    pub fn get(&self, module: &str) -> Option<&Arc<dyn Plugin>> {
        self.plugins.get(module)
    }
}

/// All rules a run can activate.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: RuleTable,
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.rules.keys()).finish()
    }
}

impl RuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a single rule.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already taken.
    pub fn register(&mut self, name: impl Into<String>, rule: RuleRef) -> Result<(), ConfigError> {
        let name = name.into();
        if self.rules.contains_key(&name) {
            return Err(ConfigError::DuplicateRule { name });
        }
        self.rules.insert(name, rule);
        Ok(())
    }

    /// Registers every rule of `table` under its own name.
    ///
    /// # Errors
    ///
    /// Returns an error if a name is already taken.
    pub fn register_table(&mut self, table: RuleTable) -> Result<(), ConfigError> {
        table
            .into_iter()
            .try_for_each(|(name, rule)| self.register(name, rule))
    }

    /// Registers the rule files of a rules directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is missing, a file is invalid or a
    /// name is already taken.
    pub fn register_rules_dir(&mut self, dir: &Path) -> Result<(), ConfigError> {
        let table = load_rules_dir(dir)?;
        debug!("{} rule(s) from {}", table.len(), dir.display());
        self.register_table(table)
    }

    /// Registers the rules of plugin `name`, looked up as `stricter-plugin-<name>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the plugin is not in `catalog` or a name is taken.
    pub fn register_plugin(&mut self, name: &str, catalog: &PluginCatalog) -> Result<(), ConfigError> {
        let module = plugin_module_name(name);
        let plugin = catalog.get(&module).ok_or_else(|| ConfigError::PluginNotFound {
            plugin: name.to_string(),
            module: module.clone(),
        })?;

        let rules = plugin.rules();
        debug!("{} rule(s) from plugin {module}", rules.len());
        for (rule, definition) in rules {
            self.register(format!("{name}/{rule}"), definition)?;
        }
        Ok(())
    }

    /// Looks up a rule by qualified name.
    ///
    /// # Errors
    ///
    /// Returns an error if no rule is registered under `name`.
    pub fn resolve(&self, name: &str) -> Result<RuleRef, ConfigError> {
        self.rules
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::RuleNotFound {
                name: name.to_string(),
            })
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Registered names with their definitions.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleRef)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
