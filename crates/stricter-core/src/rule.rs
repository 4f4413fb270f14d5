//! Rule capability and the context handed to rule hooks.

use crate::graph::{PackageDescriptor, ProjectGraph};
use crate::types::Violation;

use regex::Regex;
use std::sync::Arc;

/// Error a rule hook reports instead of violations.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// An instance option is missing or malformed.
    #[error("invalid option `{key}`: {message}")]
    InvalidOption {
        /// Option key.
        key: String,
        /// What is wrong with it.
        message: String,
    },

    /// IO error while inspecting the project.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl RuleError {
    /// Creates a free-form error.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    fn invalid(key: &str, message: impl Into<String>) -> Self {
        Self::InvalidOption {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Everything a rule hook can see for one instance invocation.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Qualified name the rule is registered under.
    pub rule: &'a str,
    /// Read-only project graph.
    pub graph: &'a ProjectGraph,
    /// Rule-specific options of this instance.
    pub config: &'a toml::Value,
}

impl<'a> RuleContext<'a> {
    /// Creates a new rule context.
    #[must_use]
    pub fn new(rule: &'a str, graph: &'a ProjectGraph, config: &'a toml::Value) -> Self {
        Self {
            rule,
            graph,
            config,
        }
    }

    /// Discovered packages.
    #[must_use]
    pub fn packages(&self) -> &'a [PackageDescriptor] {
        self.graph.packages()
    }

    /// Raw option value.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&'a toml::Value> {
        self.config.get(key)
    }

    /// Gets an option as a specific type.
    #[must_use]
    pub fn get_option<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.option(key).and_then(|v| v.clone().try_into().ok())
    }

    /// Gets a boolean option with a default value.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.option(key)
            .and_then(toml::Value::as_bool)
            .unwrap_or(default)
    }

    /// Gets a string array option; a single string counts as one element.
    ///
    /// # Errors
    ///
    /// Returns an error if the option holds anything other than strings.
    pub fn get_str_array(&self, key: &str) -> Result<Vec<String>, RuleError> {
        match self.option(key) {
            None => Ok(Vec::new()),
            Some(toml::Value::String(s)) => Ok(vec![s.clone()]),
            Some(toml::Value::Array(items)) => items
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(String::from)
                        .ok_or_else(|| RuleError::invalid(key, "expected an array of strings"))
                })
                .collect(),
            Some(_) => Err(RuleError::invalid(key, "expected a string or array of strings")),
        }
    }

    /// Gets an option of regular expressions.
    ///
    /// # Errors
    ///
    /// Returns an error if the option is malformed or a pattern does not compile.
    pub fn get_regex_array(&self, key: &str) -> Result<Vec<Regex>, RuleError> {
        self.get_str_array(key)?
            .iter()
            .map(|p| Regex::new(p).map_err(|e| RuleError::invalid(key, e.to_string())))
            .collect()
    }
}

/// A project-wide rule.
///
/// A rule is instantiated once per configured instance; each call to
/// [`on_project`](Rule::on_project) sees that instance's options. The engine
/// stamps the qualified rule name and level onto the returned violations.
///
/// # Example
///
/// ```ignore
/// use stricter_core::{Rule, RuleContext, RuleError, Violation};
///
/// pub struct NoIndexFiles;
///
/// impl Rule for NoIndexFiles {
///     fn on_project(&self, ctx: &RuleContext<'_>) -> Result<Vec<Violation>, RuleError> {
///         Ok(ctx
///             .graph
///             .files()
///             .filter(|n| n.path().ends_with("index.js"))
///             .map(|n| Violation::new(n.path(), "index files are not allowed"))
///             .collect())
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &str {
        ""
    }

    /// Checks the project and returns the violations found.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule cannot run; the engine records it as an
    /// execution failure for this instance and moves on.
    fn on_project(&self, ctx: &RuleContext<'_>) -> Result<Vec<Violation>, RuleError>;
}

/// Shared rule definition handle.
pub type RuleRef = Arc<dyn Rule>;

/// Adapts a closure into a [`Rule`].
pub struct FnRule<F>(F);

impl<F> Rule for FnRule<F>
where
    F: Fn(&RuleContext<'_>) -> Result<Vec<Violation>, RuleError> + Send + Sync,
{
    fn on_project(&self, ctx: &RuleContext<'_>) -> Result<Vec<Violation>, RuleError> {
        (self.0)(ctx)
    }
}

/// Wraps `hook` as a shared rule definition.
pub fn rule_fn<F>(hook: F) -> RuleRef
where
    F: Fn(&RuleContext<'_>) -> Result<Vec<Violation>, RuleError> + Send + Sync + 'static,
{
    Arc::new(FnRule(hook))
}
