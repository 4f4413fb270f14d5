//! Configuration types for stricter.
//!
//! The on-disk format is TOML. Relative paths (`root`, `rules-dir`) are
//! resolved against the directory containing the config file.
//!
//! ```toml
//! root = "src"
//! rules-dir = ["rules", "more-rules"]
//! exclude = ['.*\.json']
//! plugins = ["abc"]
//! packages = ["f*"]
//!
//! [[rules."stricter/unused-files"]]
//! level = "error"
//! config = { entry = ['/src/index\.js'] }
//! ```

use crate::rules_config::{RuleInstanceConfig, RuleMapping, RuleTemplate, RulesDeclaration};
use crate::types::Level;

use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Prefix of plugin module names: plugin `abc` is looked up as `stricter-plugin-abc`.
pub const PLUGIN_PREFIX: &str = "stricter-plugin-";

/// Returns the module name a plugin suffix resolves to.
#[must_use]
pub fn plugin_module_name(plugin: &str) -> String {
    format!("{PLUGIN_PREFIX}{plugin}")
}

/// Validated engine configuration.
#[derive(Debug, Clone)]
pub struct StricterConfig {
    /// Analysis root directory.
    pub root: PathBuf,
    /// Extra rule-definition directories.
    pub rules_dirs: Vec<PathBuf>,
    /// Paths matching any of these are skipped during the graph walk.
    pub exclude: Vec<Regex>,
    /// Rule activation and instance configs.
    pub rules: RulesDeclaration,
    /// Plugin name suffixes.
    pub plugins: Vec<String>,
    /// Glob patterns overriding package discovery.
    pub packages: Option<Vec<String>>,
}

impl StricterConfig {
    /// Creates a configuration for `root` with no rules.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            rules_dirs: Vec::new(),
            exclude: Vec::new(),
            rules: RulesDeclaration::default(),
            plugins: Vec::new(),
            packages: None,
        }
    }

    /// Sets the rules declaration.
    #[must_use]
    pub fn with_rules(mut self, rules: RulesDeclaration) -> Self {
        self.rules = rules;
        self
    }

    /// Adds a rules directory.
    #[must_use]
    pub fn with_rules_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.rules_dirs.push(dir.into());
        self
    }

    /// Adds an exclude pattern.
    #[must_use]
    pub fn with_exclude(mut self, pattern: Regex) -> Self {
        self.exclude.push(pattern);
        self
    }

    /// Adds a plugin by name suffix.
    #[must_use]
    pub fn with_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugins.push(plugin.into());
        self
    }

    /// Overrides package discovery with glob patterns.
    #[must_use]
    pub fn with_packages<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&content, base).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: Some(path.to_path_buf()),
                message,
            },
            other => other,
        })
    }

    /// Parses configuration from a TOML string, resolving relative paths against `base`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn parse(content: &str, base: &Path) -> Result<Self, ConfigError> {
        let dto: ConfigDto = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: None,
            message: e.to_string(),
        })?;
        dto.into_config(base)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ConfigDto {
    root: Option<PathBuf>,
    #[serde(default, alias = "rulesDir")]
    rules_dir: Option<OneOrMany<PathBuf>>,
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default)]
    rules: IndexMap<String, Vec<RuleInstanceDto>>,
    #[serde(default)]
    plugins: Vec<String>,
    #[serde(default)]
    packages: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RuleInstanceDto {
    #[serde(default)]
    level: Level,
    #[serde(default)]
    config: Option<toml::Value>,
    #[serde(default, alias = "forEachPackage")]
    for_each_package: bool,
}

impl ConfigDto {
    fn into_config(self, base: &Path) -> Result<StricterConfig, ConfigError> {
        let root = self.root.ok_or(ConfigError::MissingRoot)?;

        let exclude = self
            .exclude
            .into_iter()
            .map(|pattern| {
                Regex::new(&pattern).map_err(|source| ConfigError::InvalidRegex { pattern, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(patterns) = &self.packages {
            for pattern in patterns {
                glob::Pattern::new(pattern).map_err(|source| ConfigError::InvalidGlob {
                    pattern: pattern.clone(),
                    source,
                })?;
            }
        }

        let templates: IndexMap<String, Vec<RuleTemplate>> = self
            .rules
            .into_iter()
            .map(|(name, instances)| {
                let instances = instances
                    .into_iter()
                    .map(|dto| RuleTemplate {
                        instance: RuleInstanceConfig::new(dto.level)
                            .with_config(dto.config.unwrap_or_else(empty_table)),
                        for_each_package: dto.for_each_package,
                    })
                    .collect();
                (name, instances)
            })
            .collect();

        Ok(StricterConfig {
            root: base.join(root),
            rules_dirs: self
                .rules_dir
                .map(OneOrMany::into_vec)
                .unwrap_or_default()
                .into_iter()
                .map(|dir| base.join(dir))
                .collect(),
            exclude,
            rules: RulesDeclaration::from_templates(templates),
            plugins: self.plugins,
            packages: self.packages,
        })
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" {}", p.display()))
        .unwrap_or_default()
}

pub(crate) fn empty_table() -> toml::Value {
    toml::Value::Table(toml::Table::new())
}

/// A static mapping, as accepted by [`RulesDeclaration::Static`].
#[must_use]
pub fn rule_mapping<I, S>(entries: I) -> RuleMapping
where
    I: IntoIterator<Item = (S, Vec<RuleInstanceConfig>)>,
    S: Into<String>,
{
    entries.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Configuration errors. All of them abort a run before any reporting.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config{}: {message}", display_path(.path))]
    Parse {
        /// Config file, when parsing from disk.
        path: Option<PathBuf>,
        /// Parse error message.
        message: String,
    },

    /// The required `root` field is missing.
    #[error("Missing required field `root`")]
    MissingRoot,

    /// An `exclude` entry is not a valid regular expression.
    #[error("Invalid exclude pattern `{pattern}`: {source}")]
    InvalidRegex {
        /// The offending pattern.
        pattern: String,
        /// Underlying regex error.
        source: regex::Error,
    },

    /// A `packages` entry is not a valid glob.
    #[error("Invalid package pattern `{pattern}`: {source}")]
    InvalidGlob {
        /// The offending pattern.
        pattern: String,
        /// Underlying glob error.
        source: glob::PatternError,
    },

    /// A configured rules directory does not exist.
    #[error("Rules directory not found: {path}")]
    RulesDirNotFound {
        /// Missing directory.
        path: PathBuf,
    },

    /// A rule file in a rules directory is invalid.
    #[error("Invalid rule definition {path}: {message}")]
    InvalidRuleFile {
        /// Offending file.
        path: PathBuf,
        /// What is wrong with it.
        message: String,
    },

    /// A configured plugin is not available.
    #[error("Plugin `{plugin}` not found (looked up as `{module}`)")]
    PluginNotFound {
        /// Plugin name suffix from the config.
        plugin: String,
        /// Module name it resolved to.
        module: String,
    },

    /// Two sources registered the same rule name.
    #[error("Rule `{name}` is registered more than once")]
    DuplicateRule {
        /// Qualified rule name.
        name: String,
    },

    /// The configuration references a rule nobody registered.
    #[error("Rule `{name}` not found")]
    RuleNotFound {
        /// Qualified rule name.
        name: String,
    },
}
