//! Rule execution engine.
//!
//! Rules run in declaration order and each rule's instances in their own
//! order, one at a time. Violations are collected in exactly that order.
//! A failing or panicking hook becomes a [`RuleFailure`] and the run goes on.

use crate::config::ConfigError;
use crate::graph::ProjectGraph;
use crate::registry::RuleRegistry;
use crate::rule::{RuleContext, RuleRef};
use crate::rules_config::{RuleInstanceConfig, RuleMapping};
use crate::types::{ApplicationResult, RuleFailure};

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, error, info, warn};

/// Runs configured rule instances against a project graph.
#[derive(Debug)]
pub struct Engine<'r> {
    registry: &'r RuleRegistry,
    only: Option<Vec<String>>,
}

impl<'r> Engine<'r> {
    /// Creates an engine that looks rules up in `registry`.
    #[must_use]
    pub fn new(registry: &'r RuleRegistry) -> Self {
        Self {
            registry,
            only: None,
        }
    }

    /// Restricts execution to the named rules; `None` runs everything.
    #[must_use]
    pub fn only(mut self, rules: Option<Vec<String>>) -> Self {
        self.only = rules;
        self
    }

    /// Runs every selected rule instance of `mapping`.
    ///
    /// # Errors
    ///
    /// Returns an error before running anything if a selected rule is not
    /// registered.
    pub fn run(
        &self,
        graph: &ProjectGraph,
        mapping: &RuleMapping,
    ) -> Result<ApplicationResult, ConfigError> {
        let plan = self.plan(mapping)?;
        info!("Running {} rule(s)", plan.len());

        let mut result = ApplicationResult::new();
        for (name, rule, instances) in plan {
            for (index, instance) in instances.iter().enumerate() {
                run_instance(&mut result, graph, name, &rule, index, instance);
            }
        }
        Ok(result)
    }

    fn plan<'m>(
        &self,
        mapping: &'m RuleMapping,
    ) -> Result<Vec<(&'m str, RuleRef, &'m [RuleInstanceConfig])>, ConfigError> {
        if let Some(only) = &self.only {
            for name in only.iter().filter(|n| !mapping.contains_key(*n)) {
                warn!("Rule `{name}` is not configured, nothing to verify");
            }
        }

        mapping
            .iter()
            .filter(|(name, _)| self.is_selected(name))
            .map(|(name, instances)| {
                let rule = self.registry.resolve(name)?;
                Ok((name.as_str(), rule, instances.as_slice()))
            })
            .collect()
    }

    fn is_selected(&self, name: &str) -> bool {
        self.only
            .as_ref()
            .map_or(true, |only| only.iter().any(|n| n == name))
    }
}

/// Runs `mapping` against `graph` with every configured rule selected.
///
/// # Errors
///
/// Returns an error if a configured rule is not registered.
pub fn run(
    graph: &ProjectGraph,
    mapping: &RuleMapping,
    registry: &RuleRegistry,
) -> Result<ApplicationResult, ConfigError> {
    Engine::new(registry).run(graph, mapping)
}

fn run_instance(
    result: &mut ApplicationResult,
    graph: &ProjectGraph,
    name: &str,
    rule: &RuleRef,
    index: usize,
    instance: &RuleInstanceConfig,
) {
    let ctx = RuleContext::new(name, graph, &instance.config);
    let outcome = catch_unwind(AssertUnwindSafe(|| rule.on_project(&ctx)));

    let message = match outcome {
        Ok(Ok(violations)) => {
            debug!("{name} #{index}: {} violation(s)", violations.len());
            let stamped = violations
                .into_iter()
                .map(|v| v.stamped(name, instance.level))
                .collect();
            result.push(name, stamped);
            return;
        }
        Ok(Err(e)) => e.to_string(),
        Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
    };

    error!("Rule {name} #{index} failed: {message}");
    result.failures.push(RuleFailure {
        rule: name.to_string(),
        instance: index,
        message,
    });
}

/// Text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
