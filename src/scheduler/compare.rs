//! Side-by-side strategy comparison.
//!
//! Each strategy runs on its own scoped thread against its own copy of the
//! operations and snapshot; nothing mutable is shared. Results are keyed by
//! strategy name, so the map order is stable across runs. A strategy that
//! panics is reported under `failures` with its panic message.

use std::any::Any;
use std::collections::BTreeMap;
use std::thread;

use serde::Serialize;
use tracing::{error, info};

use super::kpi::DelayMetric;
use super::strategy::{SearchStats, Strategy, StrategyKind};
use crate::config::SchedulerConfig;
use crate::models::{OperationRequest, ResourceSnapshot, Schedule};

/// One strategy's result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyReport {
    /// Schedule produced.
    pub schedule: Schedule,
    /// Summary metrics.
    pub metric: DelayMetric,
    /// Search diagnostics, when the strategy searches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<SearchStats>,
}

/// Results of a comparison run, keyed by strategy name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Comparison {
    reports: BTreeMap<String, StrategyReport>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    failures: BTreeMap<String, String>,
}

impl Comparison {
    /// Report of one strategy.
    pub fn report(&self, strategy: &str) -> Option<&StrategyReport> {
        self.reports.get(strategy)
    }

    /// All reports, by strategy name.
    pub fn reports(&self) -> &BTreeMap<String, StrategyReport> {
        &self.reports
    }

    /// Strategies that panicked, with their panic message.
    pub fn failures(&self) -> &BTreeMap<String, String> {
        &self.failures
    }

    /// Consumes the comparison into (reports, failures).
    pub fn into_parts(self) -> (BTreeMap<String, StrategyReport>, BTreeMap<String, String>) {
        (self.reports, self.failures)
    }

    /// Strategy with the least (unassigned, total delay), ties by name.
    pub fn best(&self) -> Option<(&str, &StrategyReport)> {
        self.reports
            .iter()
            .min_by_key(|(_, r)| (r.metric.unassigned_operations, r.metric.total_delay_ms))
            .map(|(name, r)| (name.as_str(), r))
    }

    /// Number of reports.
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    /// Whether no strategy reported.
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

/// Runs several strategies on the same input.
#[derive(Debug, Default)]
pub struct Comparator {
    strategies: Vec<Box<dyn Strategy>>,
}

impl Comparator {
    /// Creates an empty comparator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Comparator over built-in strategies.
    pub fn from_kinds(kinds: &[StrategyKind], config: &SchedulerConfig) -> Self {
        Self {
            strategies: kinds.iter().map(|k| k.build(config)).collect(),
        }
    }

    /// Adds a strategy.
    pub fn with_strategy<S: Strategy + 'static>(mut self, strategy: S) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Strategy names in insertion order.
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Runs every strategy concurrently and collects their reports.
    ///
    /// A strategy that panics is logged and listed in
    /// [`Comparison::failures`] instead of the reports.
    pub fn compare(
        &self,
        operations: &[OperationRequest],
        resources: &ResourceSnapshot,
    ) -> Comparison {
        let (reports, failures) = thread::scope(|scope| {
            let handles: Vec<_> = self
                .strategies
                .iter()
                .map(|strategy| {
                    let operations = operations.to_vec();
                    let resources = resources.clone();
                    let handle = scope.spawn(move || strategy.run(&operations, &resources));
                    (strategy.name(), handle)
                })
                .collect();

            let mut reports = BTreeMap::new();
            let mut failures = BTreeMap::new();
            for (name, handle) in handles {
                match handle.join() {
                    Ok(run) => {
                        let metric = DelayMetric::calculate(&run.schedule);
                        info!(
                            strategy = name,
                            total_delay_ms = metric.total_delay_ms,
                            max_delay_ms = metric.max_delay_ms,
                            unassigned = metric.unassigned_operations,
                            "strategy finished"
                        );
                        reports.insert(
                            name.to_string(),
                            StrategyReport {
                                schedule: run.schedule,
                                metric,
                                diagnostics: run.stats,
                            },
                        );
                    }
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        error!(strategy = name, %message, "strategy panicked");
                        failures.insert(name.to_string(), message);
                    }
                }
            }
            (reports, failures)
        });

        Comparison { reports, failures }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "strategy panicked".to_string()
    }
}
