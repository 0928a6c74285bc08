//! Dispatching rules and rule engine for operation ordering.
//!
//! Serial strategies place operations one at a time; the order they are
//! handed over in is decided here. Rules are composable: a primary rule
//! decides, later rules only break its ties.
//!
//! # Usage
//!
//! ```
//! use port_schedule::dispatching::{RuleEngine, SchedulingContext, TieBreaker};
//! use port_schedule::dispatching::rules;
//!
//! let engine = RuleEngine::new()
//!     .with_rule(rules::EarliestStart)
//!     .with_final_tie_breaker(TieBreaker::ById);
//!
//! let context = SchedulingContext::at_time(0);
//! assert!(engine.sort_indices(&[], &context).is_empty());
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

mod context;
mod engine;
pub mod rules;

pub use context::SchedulingContext;
pub use engine::{EvaluationMode, RuleEngine, TieBreaker};

use crate::models::OperationRequest;
use std::fmt::Debug;

/// Score returned by a dispatching rule.
///
/// Lower scores = higher priority (placed first).
pub type RuleScore = f64;

/// A dispatching rule that evaluates operation priority.
///
/// # Score Convention
/// **Lower score = higher priority.**
pub trait DispatchingRule: Send + Sync + Debug {
    /// Rule name (e.g., "FIFO", "EDD").
    fn name(&self) -> &'static str;

    /// Evaluates the priority of an operation in the given context.
    fn evaluate(&self, operation: &OperationRequest, context: &SchedulingContext) -> RuleScore;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
