//! Local-search strategy.
//!
//! # Algorithm
//!
//! First-improvement hill climbing over the greedy decision vector.
//!
//! Neighborhood:
//! - swap the order of two operations placed at the same dock,
//! - change one operation's crane count,
//! - move one operation to another candidate dock.
//!
//! Each neighbor is decoded, replayed through the delay propagator and
//! scored. A neighbor is accepted only if it
//! [improves on](super::plan::Objective::improves_on) the current plan.
//! At a local optimum the best plan is perturbed with seeded random swaps
//! and the climb restarts, up to `max_restarts` times.
//!
//! Starting from the greedy plan and accepting only improvements, the
//! result is never worse than greedy.
//!
//! # Reference
//! Hoos & Stützle (2004), "Stochastic Local Search", Ch. 2

use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::greedy::GreedyStrategy;
use super::plan::{Decision, Objective, PlanContext};
use super::propagate::DelayPropagator;
use super::strategy::{SearchStats, Strategy, StrategyRun};
use crate::config::SchedulerConfig;
use crate::models::{OperationRequest, ResourceSnapshot, Schedule};

/// A change to a decision vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    /// Exchange the positions of two decisions.
    Swap(usize, usize),
    /// Use another placement option at a position.
    Retarget { position: usize, option: usize },
}

impl Move {
    fn apply(&self, decisions: &[Decision]) -> Vec<Decision> {
        let mut next = decisions.to_vec();
        match *self {
            Move::Swap(i, j) => next.swap(i, j),
            Move::Retarget { position, option } => next[position].option = option,
        }
        next
    }
}

/// Best plan found by [`LocalSearchStrategy::search`].
#[derive(Debug, Clone)]
pub(crate) struct SearchOutcome {
    pub decisions: Vec<Decision>,
    pub objective: Objective,
    pub stats: SearchStats,
}

/// Hill climbing with perturbation restarts, seeded by greedy.
#[derive(Debug, Clone)]
pub struct LocalSearchStrategy {
    config: SchedulerConfig,
    greedy: GreedyStrategy,
}

impl LocalSearchStrategy {
    /// Creates a local-search strategy.
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            greedy: GreedyStrategy::new(config.clone()),
            config,
        }
    }

    pub(crate) fn search(&self, ctx: &PlanContext<'_>) -> SearchOutcome {
        let started = Instant::now();
        let settings = &self.config.local_search;
        let propagator = DelayPropagator::new(ctx.resources());
        let evaluate = |decisions: &[Decision]| -> Objective {
            let schedule = ctx.decode(decisions).into_schedule(ctx, self.name());
            Objective::of_schedule(&propagator.propagate(schedule))
        };

        let mut stats = SearchStats::default();
        let mut rng = SmallRng::seed_from_u64(settings.seed);

        let (initial, _) = self.greedy.plan(ctx);
        let mut current_obj = evaluate(&initial);
        let mut current = initial;
        let mut best = current.clone();
        let mut best_obj = current_obj;
        let mut exhausted = false;

        loop {
            // Descent to a local optimum.
            'descent: loop {
                for mv in neighbors(ctx, &current) {
                    if stats.nodes_explored >= settings.max_iterations {
                        exhausted = true;
                        break 'descent;
                    }
                    let candidate = mv.apply(&current);
                    let obj = evaluate(&candidate);
                    stats.nodes_explored += 1;
                    if obj.improves_on(&current_obj) {
                        debug!(?mv, total_delay_ms = obj.total_delay_ms, "accepted move");
                        current = candidate;
                        current_obj = obj;
                        stats.improvements += 1;
                        continue 'descent;
                    }
                }
                break;
            }

            if current_obj.improves_on(&best_obj) {
                best = current.clone();
                best_obj = current_obj;
            }
            if exhausted
                || best_obj == Objective::default()
                || stats.restarts >= settings.max_restarts
                || best.len() < 2
            {
                break;
            }

            stats.restarts += 1;
            current = best.clone();
            for _ in 0..settings.perturbation_strength {
                let i = rng.random_range(0..current.len());
                let j = rng.random_range(0..current.len());
                current.swap(i, j);
            }
            current_obj = evaluate(&current);
            stats.nodes_explored += 1;
        }

        stats.elapsed_ms = started.elapsed().as_millis() as u64;
        SearchOutcome {
            decisions: best,
            objective: best_obj,
            stats,
        }
    }
}

/// Enumerates moves in a fixed order: swaps first, then retargets.
fn neighbors(ctx: &PlanContext<'_>, decisions: &[Decision]) -> Vec<Move> {
    let dock_of = |d: &Decision| {
        ctx.options(d.op)
            .get(d.option)
            .map(|o| o.dock_code.as_str())
    };

    let mut moves = Vec::new();
    for i in 0..decisions.len() {
        let Some(dock) = dock_of(&decisions[i]) else {
            continue;
        };
        for j in (i + 1)..decisions.len() {
            if dock_of(&decisions[j]) == Some(dock) {
                moves.push(Move::Swap(i, j));
            }
        }
    }
    for (position, d) in decisions.iter().enumerate() {
        if ctx.blocker(d.op).is_some() {
            continue;
        }
        for option in 0..ctx.options(d.op).len() {
            if option != d.option {
                moves.push(Move::Retarget { position, option });
            }
        }
    }
    moves
}

impl Strategy for LocalSearchStrategy {
    fn name(&self) -> &str {
        "local-search"
    }

    fn solve(&self, operations: &[OperationRequest], resources: &ResourceSnapshot) -> Schedule {
        self.run(operations, resources).schedule
    }

    fn run(&self, operations: &[OperationRequest], resources: &ResourceSnapshot) -> StrategyRun {
        let ctx = PlanContext::new(operations, resources, &self.config);
        let outcome = self.search(&ctx);
        info!(
            total_delay_ms = outcome.objective.total_delay_ms,
            unassigned = outcome.objective.unassigned,
            evaluated = outcome.stats.nodes_explored,
            restarts = outcome.stats.restarts,
            "local search finished"
        );
        let schedule = ctx.decode(&outcome.decisions).into_schedule(&ctx, self.name());
        StrategyRun {
            schedule: DelayPropagator::new(resources).propagate(schedule),
            stats: Some(outcome.stats),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocalSearchConfig;
    use crate::models::{Dock, StaffMember};

    const H: i64 = 3_600_000;

    fn resources() -> ResourceSnapshot {
        ResourceSnapshot::new()
            .with_dock(Dock::new("D1").with_crane("C1", "STS"))
            .with_staff(StaffMember::new("S1").with_shift(0, 24 * H))
            .with_staff(StaffMember::new("S2").with_shift(0, 24 * H))
    }

    /// A long job arriving first blocks a short, tight one.
    fn convoy() -> Vec<OperationRequest> {
        vec![
            OperationRequest::new("LONG", "V1", "D1")
                .with_work(6 * H, 0)
                .with_planned_departure(12 * H),
            OperationRequest::new("SHORT", "V2", "D1")
                .with_earliest_start(1)
                .with_work(H, 0),
        ]
    }

    #[test]
    fn test_improves_on_greedy_by_reordering() {
        let res = resources();
        let ops = convoy();
        let config = SchedulerConfig::default();
        let greedy = GreedyStrategy::new(config.clone()).solve(&ops, &res);
        let ls = LocalSearchStrategy::new(config).solve(&ops, &res);

        // greedy: LONG [0,6h), SHORT runs [6h,7h) against a plan of 1h + 1ms
        assert_eq!(greedy.total_delay_ms(), 6 * H - 1);
        assert!(ls.total_delay_ms() < greedy.total_delay_ms());
        assert_eq!(ls.assignment_for("SHORT").unwrap().window.start_ms, 1);
        assert_eq!(ls.strategy, "local-search");
    }

    #[test]
    fn test_never_worse_than_greedy() {
        let res = resources();
        let ops = vec![
            OperationRequest::new("A", "V1", "D1").with_work(2 * H, 0),
            OperationRequest::new("B", "V2", "D1").with_work(2 * H, 0),
            OperationRequest::new("C", "V3", "D1").with_earliest_start(H).with_work(H, 0),
        ];
        let config = SchedulerConfig::default();
        let greedy = GreedyStrategy::new(config.clone()).solve(&ops, &res);
        let ls = LocalSearchStrategy::new(config).solve(&ops, &res);
        assert!(ls.total_delay_ms() <= greedy.total_delay_ms());
    }

    #[test]
    fn test_iteration_budget() {
        let res = resources();
        let ops = convoy();
        let config = SchedulerConfig {
            local_search: LocalSearchConfig {
                max_iterations: 0,
                ..LocalSearchConfig::default()
            },
            ..SchedulerConfig::default()
        };
        let run = LocalSearchStrategy::new(config.clone()).run(&ops, &res);
        let stats = run.stats.unwrap();
        assert_eq!(stats.nodes_explored, 0);
        assert_eq!(stats.restarts, 0);
        let greedy = GreedyStrategy::new(config).solve(&ops, &res);
        assert_eq!(run.schedule.total_delay_ms(), greedy.total_delay_ms());
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let res = resources();
        let ops = convoy();
        let ls = LocalSearchStrategy::new(SchedulerConfig::default());
        assert_eq!(ls.run(&ops, &res).schedule, ls.run(&ops, &res).schedule);
    }

    #[test]
    fn test_empty_input() {
        let run = LocalSearchStrategy::new(SchedulerConfig::default()).run(&[], &resources());
        assert!(run.schedule.is_empty());
        assert_eq!(run.schedule.total_delay_ms(), 0);
    }
}
