//! Strategy abstraction.
//!
//! Every solving approach implements [`Strategy`]. The comparator and the
//! delay propagator only see this trait, so a new approach (for example a
//! wrapper around an external constraint solver) plugs in without touching
//! either.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{GreedyStrategy, LocalSearchStrategy, OptimalStrategy};
use crate::config::SchedulerConfig;
use crate::error::ScheduleError;
use crate::models::{OperationRequest, ResourceSnapshot, Schedule};

/// A scheduling strategy.
pub trait Strategy: Send + Sync + fmt::Debug {
    /// Stable strategy name, used as the comparison key.
    fn name(&self) -> &str;

    /// Schedules `operations` on `resources`.
    ///
    /// Operations that cannot be placed are listed as unassigned with a
    /// reason; they never abort the run.
    fn solve(&self, operations: &[OperationRequest], resources: &ResourceSnapshot) -> Schedule;

    /// Like [`solve`](Self::solve), with search diagnostics when the
    /// strategy records any.
    fn run(&self, operations: &[OperationRequest], resources: &ResourceSnapshot) -> StrategyRun {
        StrategyRun {
            schedule: self.solve(operations, resources),
            stats: None,
        }
    }
}

/// Schedule plus optional search diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyRun {
    /// Resulting schedule.
    pub schedule: Schedule,
    /// Search statistics, if the strategy searches.
    pub stats: Option<SearchStats>,
}

/// Counters reported by searching strategies.
///
/// For local search a "node" is one evaluated neighbor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Nodes (or neighbors) evaluated.
    pub nodes_explored: u64,
    /// Branches cut by the bound.
    pub nodes_pruned: u64,
    /// Improving solutions found.
    pub improvements: u64,
    /// Perturbation restarts performed.
    pub restarts: u32,
    /// Wall-clock time spent (ms).
    pub elapsed_ms: u64,
}

/// Built-in strategy selector.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Branch-and-bound.
    Optimal,
    /// Earliest-start serial placement.
    Greedy,
    /// Hill climbing with perturbation restarts.
    LocalSearch,
}

impl StrategyKind {
    /// All built-in strategies.
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::Optimal,
        StrategyKind::Greedy,
        StrategyKind::LocalSearch,
    ];

    /// Selector name.
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Optimal => "optimal",
            StrategyKind::Greedy => "greedy",
            StrategyKind::LocalSearch => "local-search",
        }
    }

    /// Instantiates the strategy with `config`.
    pub fn build(&self, config: &SchedulerConfig) -> Box<dyn Strategy> {
        match self {
            StrategyKind::Optimal => Box::new(OptimalStrategy::new(config.clone())),
            StrategyKind::Greedy => Box::new(GreedyStrategy::new(config.clone())),
            StrategyKind::LocalSearch => Box::new(LocalSearchStrategy::new(config.clone())),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optimal" => Ok(StrategyKind::Optimal),
            "greedy" => Ok(StrategyKind::Greedy),
            "local-search" | "local_search" | "localsearch" => Ok(StrategyKind::LocalSearch),
            _ => Err(ScheduleError::UnknownStrategy(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selectors() {
        assert_eq!("optimal".parse::<StrategyKind>().unwrap(), StrategyKind::Optimal);
        assert_eq!(" Greedy ".parse::<StrategyKind>().unwrap(), StrategyKind::Greedy);
        assert_eq!(
            "local-search".parse::<StrategyKind>().unwrap(),
            StrategyKind::LocalSearch
        );
        assert!(matches!(
            "genetic".parse::<StrategyKind>(),
            Err(ScheduleError::UnknownStrategy(s)) if s == "genetic"
        ));
    }

    #[test]
    fn test_display_matches_serde() {
        for kind in StrategyKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn test_build_names() {
        let config = SchedulerConfig::default();
        for kind in StrategyKind::ALL {
            assert_eq!(kind.build(&config).name(), kind.as_str());
        }
    }
}
