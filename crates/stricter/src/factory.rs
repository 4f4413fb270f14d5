//! Engine entry point.
//!
//! A run loads the configuration, registers built-in, directory and plugin
//! rules, builds the project graph, resolves the rule declaration against the
//! discovered packages, executes the rules, reports and optionally applies
//! fixes. Configuration problems abort the run before anything is reported.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use stricter_core::report::report_result;
use stricter_core::{
    apply_fixes, ApplicationResult, ConfigContext, ConfigError, ConsoleReporter, Engine,
    FixReport, GraphBuilder, GraphError, PluginCatalog, ProjectGraph, Reporter,
    ResolutionCache, Resolver, RuleRegistry, StricterConfig,
};
use tracing::{debug, info};

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum StricterError {
    /// Invalid configuration or unknown rule.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The project graph could not be built.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Where the configuration comes from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// A TOML file, read at the start of every run.
    Path(PathBuf),
    /// An already built configuration.
    Config(StricterConfig),
}

/// Options of [`get_stricter`] and [`Stricter::new`].
#[derive(Clone)]
pub struct StricterOptions {
    /// Configuration source.
    pub config: ConfigSource,
    /// Line sink; defaults to [`ConsoleReporter`].
    pub reporter: Option<Arc<dyn Reporter>>,
    /// Run only these rules, when set.
    pub rules_to_verify: Option<Vec<String>>,
    /// Empty the resolution cache before the run.
    pub clear_cache: bool,
    /// Apply collected fixes after reporting.
    pub fix: bool,
    /// Plugins available to the `plugins` config entry.
    pub plugins: PluginCatalog,
    /// Resolution cache; defaults to the process-wide one.
    pub cache: Option<Arc<ResolutionCache>>,
}

impl StricterOptions {
    /// Options reading the configuration from `path`.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(ConfigSource::Path(path.into()))
    }

    /// Options using an in-memory configuration.
    #[must_use]
    pub fn from_config(config: StricterConfig) -> Self {
        Self::new(ConfigSource::Config(config))
    }

    fn new(config: ConfigSource) -> Self {
        Self {
            config,
            reporter: None,
            rules_to_verify: None,
            clear_cache: false,
            fix: false,
            plugins: PluginCatalog::new(),
            cache: None,
        }
    }

    /// Sets the reporter.
    #[must_use]
    pub fn reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Restricts the run to the named rules.
    #[must_use]
    pub fn rules_to_verify<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules_to_verify = Some(rules.into_iter().map(Into::into).collect());
        self
    }

    /// Sets whether the resolution cache is cleared first.
    #[must_use]
    pub fn clear_cache(mut self, clear: bool) -> Self {
        self.clear_cache = clear;
        self
    }

    /// Sets whether fixes are applied.
    #[must_use]
    pub fn fix(mut self, fix: bool) -> Self {
        self.fix = fix;
        self
    }

    /// Sets the plugin catalog.
    #[must_use]
    pub fn plugins(mut self, plugins: PluginCatalog) -> Self {
        self.plugins = plugins;
        self
    }

    /// Uses a dedicated resolution cache.
    #[must_use]
    pub fn cache(mut self, cache: Arc<ResolutionCache>) -> Self {
        self.cache = Some(cache);
        self
    }
}

impl std::fmt::Debug for StricterOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StricterOptions")
            .field("config", &self.config)
            .field("rules_to_verify", &self.rules_to_verify)
            .field("clear_cache", &self.clear_cache)
            .field("fix", &self.fix)
            .field("plugins", &self.plugins)
            .finish_non_exhaustive()
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Error-level violations.
    pub error_count: usize,
    /// Warn-level violations.
    pub warning_count: usize,
    /// Rule instances that failed to execute.
    pub failure_count: usize,
    /// Fix actions that completed.
    pub fixes_applied: usize,
    /// Rules whose fixes stopped on a failure.
    pub fix_failures: Vec<String>,
    /// Full result, in execution order.
    pub result: ApplicationResult,
}

impl RunOutcome {
    /// Whether the run should be treated as failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.error_count > 0 || self.failure_count > 0
    }
}

/// A configured engine.
#[derive(Debug, Clone)]
pub struct Stricter {
    options: StricterOptions,
}

impl Stricter {
    /// Creates an engine from `options`.
    #[must_use]
    pub fn new(options: StricterOptions) -> Self {
        Self { options }
    }

    /// Loads the configuration this engine runs with.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be loaded.
    pub fn load_config(&self) -> Result<StricterConfig, ConfigError> {
        match &self.options.config {
            ConfigSource::Path(path) => StricterConfig::from_file(path),
            ConfigSource::Config(config) => Ok(config.clone()),
        }
    }

    /// Builds the registry for `config`: built-ins, rules directories, plugins.
    ///
    /// # Errors
    ///
    /// Returns an error for a missing rules directory or plugin, an invalid
    /// rule file, or a duplicated rule name.
    pub fn registry(&self, config: &StricterConfig) -> Result<RuleRegistry, ConfigError> {
        let mut registry = RuleRegistry::new();
        registry.register_table(stricter_rules::builtin_rules())?;
        for dir in &config.rules_dirs {
            registry.register_rules_dir(dir)?;
        }
        for plugin in &config.plugins {
            registry.register_plugin(plugin, &self.options.plugins)?;
        }
        debug!("{} rule(s) registered", registry.len());
        Ok(registry)
    }

    /// Builds the project graph for `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is invalid or package discovery fails.
    pub fn graph(&self, config: &StricterConfig) -> Result<ProjectGraph, GraphError> {
        let cache = self
            .options
            .cache
            .clone()
            .unwrap_or_else(ResolutionCache::global);
        if self.options.clear_cache {
            debug!("Clearing {} cached resolution(s)", cache.len());
            cache.clear();
        }

        let builder = GraphBuilder::new(&config.root)
            .excludes(config.exclude.iter().cloned())
            .packages(config.packages.clone())
            .resolver(Resolver::new(cache));
        stricter_js::register(builder).build()
    }

    /// Runs the engine once.
    ///
    /// # Errors
    ///
    /// Returns an error for configuration problems, unknown rules or an
    /// invalid root. Rule and fix failures are not errors.
    pub fn run(&self) -> Result<RunOutcome, StricterError> {
        let config = self.load_config()?;
        let registry = self.registry(&config)?;
        let graph = self.graph(&config)?;

        let ctx = ConfigContext {
            packages: graph.package_names(),
            root: graph.root().to_path_buf(),
        };
        let mapping = config.rules.resolve(&ctx);

        let result = Engine::new(&registry)
            .only(self.options.rules_to_verify.clone())
            .run(&graph, &mapping)?;

        let reporter: Arc<dyn Reporter> = self
            .options
            .reporter
            .clone()
            .unwrap_or_else(|| Arc::new(ConsoleReporter));
        report_result(reporter.as_ref(), &result);

        let fixes = if self.options.fix && result.has_fixes() {
            apply_fixes(&result)
        } else {
            FixReport::default()
        };

        let (error_count, warning_count) = result.count_by_level();
        let outcome = RunOutcome {
            error_count,
            warning_count,
            failure_count: result.failures.len(),
            fixes_applied: fixes.applied,
            fix_failures: fixes.failed_rules,
            result,
        };
        info!(
            "Run finished: {} error(s), {} warning(s), {} failure(s)",
            outcome.error_count, outcome.warning_count, outcome.failure_count
        );
        Ok(outcome)
    }
}

/// Creates a run function for `options`.
///
/// Each call performs a full, independent run.
pub fn get_stricter(options: StricterOptions) -> impl Fn() -> Result<RunOutcome, StricterError> {
    let stricter = Stricter::new(options);
    move || stricter.run()
}
