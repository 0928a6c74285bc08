//! Built-in dispatching rules.
//!
//! # Categories
//!
//! - **Arrival**: FIFO (earliest start)
//! - **Work**: SPT, LPT (baseline loading + unloading)
//! - **Due-date**: EDD (planned departure), MST (minimum slack)
//! - **Load**: LDB (least dock backlog)
//!
//! # Score Convention
//! All rules return lower scores for higher priority operations.

use super::{DispatchingRule, RuleScore, SchedulingContext};
use crate::models::OperationRequest;

/// First In First Out: earliest arrival first.
#[derive(Debug, Clone, Copy)]
pub struct EarliestStart;

impl DispatchingRule for EarliestStart {
    fn name(&self) -> &'static str {
        "FIFO"
    }

    fn evaluate(&self, operation: &OperationRequest, _context: &SchedulingContext) -> RuleScore {
        operation.earliest_start_ms as f64
    }

    fn description(&self) -> &'static str {
        "First In First Out (earliest start)"
    }
}

/// Shortest Processing Time (single-crane baseline).
///
/// # Reference
/// Smith (1956), optimal for minimizing mean flow time on single machine.
#[derive(Debug, Clone, Copy)]
pub struct Spt;

impl DispatchingRule for Spt {
    fn name(&self) -> &'static str {
        "SPT"
    }

    fn evaluate(&self, operation: &OperationRequest, _context: &SchedulingContext) -> RuleScore {
        operation.baseline_ms() as f64
    }

    fn description(&self) -> &'static str {
        "Shortest Processing Time"
    }
}

/// Longest Processing Time.
#[derive(Debug, Clone, Copy)]
pub struct Lpt;

impl DispatchingRule for Lpt {
    fn name(&self) -> &'static str {
        "LPT"
    }

    fn evaluate(&self, operation: &OperationRequest, _context: &SchedulingContext) -> RuleScore {
        -(operation.baseline_ms() as f64)
    }

    fn description(&self) -> &'static str {
        "Longest Processing Time"
    }
}

/// Earliest Due Date: earliest planned departure first.
///
/// # Reference
/// Jackson (1955), optimal for minimizing maximum lateness on single machine.
#[derive(Debug, Clone, Copy)]
pub struct EarliestDeparture;

impl DispatchingRule for EarliestDeparture {
    fn name(&self) -> &'static str {
        "EDD"
    }

    fn evaluate(&self, operation: &OperationRequest, _context: &SchedulingContext) -> RuleScore {
        operation.planned_departure() as f64
    }

    fn description(&self) -> &'static str {
        "Earliest Due Date (planned departure)"
    }
}

/// Minimum Slack Time.
///
/// Slack = (planned departure - max(now, earliest start)) - baseline work.
#[derive(Debug, Clone, Copy)]
pub struct MinSlack;

impl DispatchingRule for MinSlack {
    fn name(&self) -> &'static str {
        "MST"
    }

    fn evaluate(&self, operation: &OperationRequest, context: &SchedulingContext) -> RuleScore {
        let ready = context.current_time_ms.max(operation.earliest_start_ms);
        operation
            .planned_departure()
            .saturating_sub(ready)
            .saturating_sub(operation.baseline_ms()) as f64
    }

    fn description(&self) -> &'static str {
        "Minimum Slack Time"
    }
}

/// Least Dock Backlog.
///
/// Prefers operations whose preferred dock has the least committed work.
/// Docks missing from `context.dock_backlog_ms` count as idle.
#[derive(Debug, Clone, Copy)]
pub struct LeastDockBacklog;

impl DispatchingRule for LeastDockBacklog {
    fn name(&self) -> &'static str {
        "LDB"
    }

    fn evaluate(&self, operation: &OperationRequest, context: &SchedulingContext) -> RuleScore {
        operation
            .candidate_docks
            .iter()
            .map(|d| context.dock_backlog_ms.get(d).copied().unwrap_or(0))
            .min()
            .unwrap_or(0) as f64
    }

    fn description(&self) -> &'static str {
        "Least Dock Backlog"
    }
}
