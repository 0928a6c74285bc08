//! Greedy serial strategy.
//!
//! # Algorithm
//!
//! 1. Pick the next operation with the rule engine (default: earliest
//!    start, then ID). Rules see the plan so far: the latest committed start
//!    as the clock and the work committed per dock as backlog.
//! 2. Try every candidate dock (preference order) and crane count
//!    (ascending), each at its earliest feasible start.
//! 3. Keep the placement with the least delay; ties go to fewer cranes,
//!    then the preferred dock. An on-time placement therefore uses the
//!    smallest crane count that meets the planned departure.
//! 4. Commit immediately; no backtracking.
//!
//! # Complexity
//! O(n * (n log n + o * r)) where n = operations, o = options per operation
//! and r = release points probed per placement.

use tracing::{debug, info};

use super::plan::{Decision, Placement, PlanContext, PlanState};
use super::propagate::DelayPropagator;
use super::strategy::Strategy;
use crate::config::SchedulerConfig;
use crate::dispatching::{RuleEngine, SchedulingContext};
use crate::models::{InfeasibilityReason, OperationRequest, ResourceSnapshot, Schedule};

/// Earliest-start greedy strategy.
///
/// # Example
///
/// ```
/// use port_schedule::config::SchedulerConfig;
/// use port_schedule::models::{Dock, OperationRequest, ResourceSnapshot, StaffMember};
/// use port_schedule::scheduler::{GreedyStrategy, Strategy};
///
/// let resources = ResourceSnapshot::new()
///     .with_dock(Dock::new("D1").with_crane("C1", "STS"))
///     .with_staff(StaffMember::new("S1").with_shift(0, 43_200_000));
/// let ops = vec![OperationRequest::new("OP1", "V1", "D1").with_work(3_600_000, 0)];
///
/// let schedule = GreedyStrategy::new(SchedulerConfig::default()).solve(&ops, &resources);
/// assert_eq!(schedule.assignment_count(), 1);
/// assert_eq!(schedule.total_delay_ms(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct GreedyStrategy {
    config: SchedulerConfig,
    rule_engine: RuleEngine,
}

impl GreedyStrategy {
    /// Creates a greedy strategy ordering by earliest start.
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            rule_engine: RuleEngine::earliest_start_first(),
        }
    }

    /// Replaces the ordering rules.
    pub fn with_rule_engine(mut self, engine: RuleEngine) -> Self {
        self.rule_engine = engine;
        self
    }

    /// Builds the greedy plan and the decisions that reproduce it.
    pub(crate) fn plan(&self, ctx: &PlanContext<'_>) -> (Vec<Decision>, PlanState) {
        let mut remaining: Vec<usize> = (0..ctx.len()).collect();
        let mut state = PlanState::new();
        let mut decisions = Vec::with_capacity(ctx.len());

        loop {
            let context = dispatch_context(&state);
            let Some(op) = self
                .rule_engine
                .select(ctx.operations(), &remaining, &context)
            else {
                break;
            };
            remaining.retain(|&i| i != op);
            let mut best: Option<((i64, u32, usize), Placement)> = None;
            let mut first_failure: Option<InfeasibilityReason> = None;
            for (index, option) in ctx.options(op).iter().enumerate() {
                match state.place(ctx, op, index) {
                    Ok(placement) => {
                        let key = (placement.delay_ms, option.cranes, option.dock_rank);
                        if best.as_ref().map_or(true, |(k, _)| key < *k) {
                            best = Some((key, placement));
                        }
                    }
                    Err(reason) => {
                        first_failure.get_or_insert(reason);
                    }
                }
            }

            match best {
                Some((_, placement)) => {
                    decisions.push(Decision::new(op, placement.option));
                    state.commit(placement);
                }
                None => {
                    let reason = ctx
                        .blocker(op)
                        .or(first_failure)
                        .unwrap_or(InfeasibilityReason::NoCompatibleEquipment);
                    debug!(operation = %ctx.operations()[op].id, %reason, "greedy could not place");
                    decisions.push(Decision::new(op, 0));
                    state.reject(op, reason);
                }
            }
        }

        (decisions, state)
    }
}

/// Clock and dock backlog as seen after the placements made so far.
fn dispatch_context(state: &PlanState) -> SchedulingContext {
    let now = state
        .placements()
        .iter()
        .map(|p| p.window.start_ms)
        .max()
        .unwrap_or(0);
    let mut context = SchedulingContext::at_time(now);
    for p in state.placements() {
        *context
            .dock_backlog_ms
            .entry(p.dock_code.clone())
            .or_default() += p.window.duration_ms();
    }
    context
}

impl Strategy for GreedyStrategy {
    fn name(&self) -> &str {
        "greedy"
    }

    fn solve(&self, operations: &[OperationRequest], resources: &ResourceSnapshot) -> Schedule {
        let ctx = PlanContext::new(operations, resources, &self.config);
        let (_, state) = self.plan(&ctx);
        let objective = state.objective();
        info!(
            operations = operations.len(),
            unassigned = objective.unassigned,
            total_delay_ms = objective.total_delay_ms,
            "greedy schedule built"
        );
        DelayPropagator::new(resources).propagate(state.into_schedule(&ctx, self.name()))
    }
}
