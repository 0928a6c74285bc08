//! Branch-and-bound strategy.
//!
//! # Algorithm
//!
//! Depth-first search over (next operation, placement option). Each branch
//! owns a clone of the plan state, so siblings never observe each other's
//! commitments.
//!
//! - **Incumbent**: seeded with the local-search result, so the reported
//!   schedule is never worse than local search (and therefore greedy).
//! - **Bound**: placed delay plus, per remaining operation,
//!   `max(0, earliest_start + fastest_duration - planned_departure)`.
//!   A branch is cut when this bound cannot improve on the incumbent.
//! - **Budgets**: node limit, wall-clock limit (checked every
//!   `check_interval` nodes) and an external cancellation flag. A stopped
//!   search returns its incumbent marked [`Optimality::NotProven`];
//!   exhausting the tree yields [`Optimality::Proven`].
//!
//! # Reference
//! Land & Doig (1960), "An Automatic Method of Solving Discrete Programming Problems"

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::local_search::LocalSearchStrategy;
use super::plan::{Decision, Objective, Placement, PlanContext, PlanState};
use super::propagate::DelayPropagator;
use super::strategy::{SearchStats, Strategy, StrategyRun};
use crate::config::{OptimalConfig, SchedulerConfig};
use crate::dispatching::{RuleEngine, SchedulingContext};
use crate::models::{InfeasibilityReason, OperationRequest, Optimality, ResourceSnapshot, Schedule};

/// Best-effort exact strategy with an optimality flag.
#[derive(Debug, Clone)]
pub struct OptimalStrategy {
    config: SchedulerConfig,
    local_search: LocalSearchStrategy,
    cancel: Option<Arc<AtomicBool>>,
}

impl OptimalStrategy {
    /// Creates a branch-and-bound strategy.
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            local_search: LocalSearchStrategy::new(config.clone()),
            config,
            cancel: None,
        }
    }

    /// Stops the search as soon as `flag` becomes `true`.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }
}

/// Node, time and cancellation budget.
///
/// Reads the clock only every `check_interval` nodes.
#[derive(Debug)]
struct Budget {
    node_limit: u64,
    time_limit: Duration,
    check_interval: u64,
    since_check: u64,
    started: Instant,
    cancel: Option<Arc<AtomicBool>>,
}

impl Budget {
    fn new(config: &OptimalConfig, cancel: Option<Arc<AtomicBool>>) -> Self {
        Self {
            node_limit: config.node_limit,
            time_limit: Duration::from_millis(config.time_limit_ms),
            check_interval: config.check_interval.max(1),
            since_check: 0,
            started: Instant::now(),
            cancel,
        }
    }

    /// Returns the stop reason once any budget is spent.
    fn exceeded(&mut self, nodes: u64) -> Option<String> {
        if self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            return Some("cancelled".to_string());
        }
        if nodes >= self.node_limit {
            return Some(format!("node limit of {} reached", self.node_limit));
        }
        self.since_check += 1;
        if self.since_check >= self.check_interval {
            self.since_check = 0;
            if self.started.elapsed() >= self.time_limit {
                return Some(format!(
                    "time limit of {} ms reached",
                    self.time_limit.as_millis()
                ));
            }
        }
        None
    }
}

struct BranchAndBound<'c, 'a> {
    ctx: &'c PlanContext<'a>,
    budget: Budget,
    best: Vec<Decision>,
    best_objective: Objective,
    stats: SearchStats,
    stopped: Option<String>,
}

impl BranchAndBound<'_, '_> {
    fn search(&mut self, state: &PlanState, path: &mut Vec<Decision>, remaining: &mut Vec<usize>) {
        if self.stopped.is_some() {
            return;
        }
        if let Some(reason) = self.budget.exceeded(self.stats.nodes_explored) {
            warn!(%reason, nodes = self.stats.nodes_explored, "branch and bound stopped");
            self.stopped = Some(reason);
            return;
        }
        self.stats.nodes_explored += 1;

        if remaining.is_empty() {
            let objective = state.objective();
            if objective.improves_on(&self.best_objective) {
                debug!(
                    total_delay_ms = objective.total_delay_ms,
                    unassigned = objective.unassigned,
                    "new incumbent"
                );
                self.best = path.clone();
                self.best_objective = objective;
                self.stats.improvements += 1;
            }
            return;
        }

        if !self.can_improve(state, remaining) {
            self.stats.nodes_pruned += 1;
            return;
        }

        for idx in 0..remaining.len() {
            let op = remaining.remove(idx);

            let mut children: Vec<Placement> = Vec::new();
            let mut failure: Option<InfeasibilityReason> = None;
            for option in 0..self.ctx.options(op).len() {
                match state.place(self.ctx, op, option) {
                    Ok(placement) => children.push(placement),
                    Err(reason) => {
                        failure.get_or_insert(reason);
                    }
                }
            }
            children.sort_by_key(|p| (p.delay_ms, p.option));

            if children.is_empty() {
                let mut child = state.clone();
                child.reject(op, failure.unwrap_or(InfeasibilityReason::CapacityExhausted));
                path.push(Decision::new(op, 0));
                self.search(&child, path, remaining);
                path.pop();
            } else {
                for placement in children {
                    let decision = Decision::new(op, placement.option);
                    let mut child = state.clone();
                    child.commit(placement);
                    path.push(decision);
                    self.search(&child, path, remaining);
                    path.pop();
                    if self.stopped.is_some() {
                        break;
                    }
                }
            }

            remaining.insert(idx, op);
            if self.stopped.is_some() {
                return;
            }
        }
    }

    /// Whether some completion of `state` could improve on the incumbent.
    fn can_improve(&self, state: &PlanState, remaining: &[usize]) -> bool {
        let placed = state.objective();
        let mut bound = placed;
        for &op in remaining {
            let lb = self.ctx.delay_lower_bound(op);
            bound.total_delay_ms += lb;
            bound.max_delay_ms = bound.max_delay_ms.max(lb);
        }
        bound < self.best_objective && placed.total_delay_ms <= self.best_objective.total_delay_ms
    }
}

impl Strategy for OptimalStrategy {
    fn name(&self) -> &str {
        "optimal"
    }

    fn solve(&self, operations: &[OperationRequest], resources: &ResourceSnapshot) -> Schedule {
        self.run(operations, resources).schedule
    }

    fn run(&self, operations: &[OperationRequest], resources: &ResourceSnapshot) -> StrategyRun {
        let ctx = PlanContext::new(operations, resources, &self.config);
        let seed = self.local_search.search(&ctx);
        debug!(
            total_delay_ms = seed.objective.total_delay_ms,
            "branch and bound seeded from local search"
        );

        // Operations that can never be placed are settled at the root.
        let mut root = PlanState::new();
        let mut path = Vec::new();
        let mut remaining = Vec::new();
        let order = RuleEngine::earliest_start_first()
            .sort_indices(operations, &SchedulingContext::at_time(0));
        for op in order {
            match ctx.blocker(op) {
                Some(reason) => {
                    root.reject(op, reason);
                    path.push(Decision::new(op, 0));
                }
                None => remaining.push(op),
            }
        }

        let mut bnb = BranchAndBound {
            ctx: &ctx,
            budget: Budget::new(&self.config.optimal, self.cancel.clone()),
            best: seed.decisions,
            best_objective: seed.objective,
            stats: SearchStats::default(),
            stopped: None,
        };
        bnb.search(&root, &mut path, &mut remaining);
        bnb.stats.elapsed_ms = bnb.budget.started.elapsed().as_millis() as u64;

        let optimality = match bnb.stopped.take() {
            Some(reason) => Optimality::NotProven { reason },
            None => Optimality::Proven,
        };
        info!(
            total_delay_ms = bnb.best_objective.total_delay_ms,
            nodes = bnb.stats.nodes_explored,
            pruned = bnb.stats.nodes_pruned,
            proven = optimality.is_proven(),
            "branch and bound finished"
        );

        let schedule = ctx.decode(&bnb.best).into_schedule(&ctx, self.name());
        let mut schedule = DelayPropagator::new(resources).propagate(schedule);
        schedule.optimality = optimality;
        StrategyRun {
            schedule,
            stats: Some(bnb.stats),
        }
    }
}
