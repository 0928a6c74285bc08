//! Scheduling strategies, delay propagation and comparison.
//!
//! # Building blocks
//!
//! - [`DurationModel`]: crane count → processing time.
//! - [`StaffMatcher`]: qualification- and shift-aware crew selection.
//! - [`plan`]: serial placement shared by every strategy.
//! - [`DelayPropagator`]: replays resource timelines, fills delays.
//!
//! # Strategies
//!
//! | Strategy | Approach | Guarantee |
//! |----------|----------|-----------|
//! | [`GreedyStrategy`] | earliest-start serial placement | fast baseline |
//! | [`LocalSearchStrategy`] | hill climbing + restarts from greedy | never worse than greedy |
//! | [`OptimalStrategy`] | branch-and-bound seeded by local search | optimal unless a budget stops it |
//!
//! [`Comparator`] runs any set of strategies side by side and reports a
//! [`DelayMetric`] for each.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4
//! - Bierwirth & Meisel (2015), "A follow-up survey of berth allocation and
//!   quay crane scheduling problems in container terminals"

mod compare;
mod duration;
mod greedy;
mod kpi;
mod local_search;
mod optimal;
pub mod plan;
mod propagate;
mod staff;
mod strategy;

pub use compare::{Comparator, Comparison, StrategyReport};
pub use duration::{DurationModel, DEFAULT_EXPONENT};
pub use greedy::GreedyStrategy;
pub use kpi::DelayMetric;
pub use local_search::LocalSearchStrategy;
pub use optimal::OptimalStrategy;
pub use propagate::DelayPropagator;
pub use staff::{StaffLedger, StaffMatcher};
pub use strategy::{SearchStats, Strategy, StrategyKind, StrategyRun};
