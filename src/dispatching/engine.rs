//! Rule engine for multi-criteria dispatching.
//!
//! Every rule is evaluated once per operation; the resulting score rows are
//! then compared either lexicographically (sequential mode) or as a single
//! weighted sum.
//!
//! # Reference
//! Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::{DispatchingRule, RuleScore, SchedulingContext};
use crate::models::OperationRequest;

/// Scores closer than this are treated as equal.
const SCORE_EPSILON: f64 = 1e-9;

/// How multiple rules are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EvaluationMode {
    /// Later rules only break ties left by earlier ones.
    #[default]
    Sequential,
    /// One score: the weighted sum of all rules.
    Weighted,
}

/// How ties are broken after all rules are exhausted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TieBreaker {
    /// Keep input order.
    #[default]
    Stable,
    /// Lexicographic operation id.
    ById,
}

/// Orders operations for serial placement.
#[derive(Clone, Default)]
pub struct RuleEngine {
    rules: Vec<(Arc<dyn DispatchingRule>, f64)>,
    mode: EvaluationMode,
    tie_breaker: TieBreaker,
}

impl RuleEngine {
    /// Creates an engine without rules (input order is kept).
    pub fn new() -> Self {
        Self::default()
    }

    /// Earliest start, then operation id. Used by every built-in strategy.
    pub fn earliest_start_first() -> Self {
        Self::new()
            .with_rule(super::rules::EarliestStart)
            .with_final_tie_breaker(TieBreaker::ById)
    }

    /// Appends a rule with weight 1.0.
    pub fn with_rule<R: DispatchingRule + 'static>(self, rule: R) -> Self {
        self.with_weighted_rule(rule, 1.0)
    }

    /// Appends a rule with `weight` (only used in weighted mode).
    pub fn with_weighted_rule<R: DispatchingRule + 'static>(mut self, rule: R, weight: f64) -> Self {
        self.rules.push((Arc::new(rule), weight));
        self
    }

    /// Sets the evaluation mode.
    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the final tie-breaking strategy.
    pub fn with_final_tie_breaker(mut self, tie_breaker: TieBreaker) -> Self {
        self.tie_breaker = tie_breaker;
        self
    }

    /// Names of the configured rules, in order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|(rule, _)| rule.name()).collect()
    }

    /// Indices into `operations`, highest priority first.
    pub fn sort_indices(
        &self,
        operations: &[OperationRequest],
        context: &SchedulingContext,
    ) -> Vec<usize> {
        let all: Vec<usize> = (0..operations.len()).collect();
        self.sort_subset(operations, &all, context)
    }

    /// `candidates` (indices into `operations`), highest priority first.
    ///
    /// Stable ties keep the order of `candidates`.
    pub fn sort_subset(
        &self,
        operations: &[OperationRequest],
        candidates: &[usize],
        context: &SchedulingContext,
    ) -> Vec<usize> {
        let mut scored: Vec<(usize, Vec<RuleScore>)> = candidates
            .iter()
            .map(|&i| (i, self.score_row(&operations[i], context)))
            .collect();
        scored.sort_by(|(a, row_a), (b, row_b)| {
            compare_rows(row_a, row_b).then_with(|| match self.tie_breaker {
                TieBreaker::Stable => Ordering::Equal,
                TieBreaker::ById => operations[*a].id.cmp(&operations[*b].id),
            })
        });
        scored.into_iter().map(|(i, _)| i).collect()
    }

    /// Highest-priority entry of `candidates`.
    pub fn select(
        &self,
        operations: &[OperationRequest],
        candidates: &[usize],
        context: &SchedulingContext,
    ) -> Option<usize> {
        self.sort_subset(operations, candidates, context)
            .first()
            .copied()
    }

    fn score_row(&self, op: &OperationRequest, context: &SchedulingContext) -> Vec<RuleScore> {
        match self.mode {
            EvaluationMode::Sequential => self
                .rules
                .iter()
                .map(|(rule, _)| rule.evaluate(op, context))
                .collect(),
            EvaluationMode::Weighted => vec![self
                .rules
                .iter()
                .map(|(rule, weight)| rule.evaluate(op, context) * weight)
                .sum()],
        }
    }
}

fn compare_rows(a: &[RuleScore], b: &[RuleScore]) -> Ordering {
    a.iter()
        .zip(b)
        .find(|(x, y)| (*x - *y).abs() > SCORE_EPSILON)
        .map_or(Ordering::Equal, |(x, y)| {
            x.partial_cmp(y).unwrap_or(Ordering::Equal)
        })
}

impl fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rules: Vec<String> = self
            .rules
            .iter()
            .map(|(rule, weight)| format!("{}(w={weight})", rule.name()))
            .collect();
        f.debug_struct("RuleEngine")
            .field("rules", &rules)
            .field("mode", &self.mode)
            .field("tie_breaker", &self.tie_breaker)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatching::rules;

    fn op(id: &str, start: i64, work: i64) -> OperationRequest {
        OperationRequest::new(id, format!("V-{id}"), "D1")
            .with_earliest_start(start)
            .with_work(work, 0)
    }

    fn order(engine: &RuleEngine, ops: &[OperationRequest]) -> Vec<String> {
        engine
            .sort_indices(ops, &SchedulingContext::at_time(0))
            .into_iter()
            .map(|i| ops[i].id.clone())
            .collect()
    }

    #[test]
    fn test_earliest_start_ordering() {
        let ops = vec![op("late", 5_000, 100), op("early", 1_000, 100), op("mid", 3_000, 100)];
        assert_eq!(
            order(&RuleEngine::earliest_start_first(), &ops),
            vec!["early", "mid", "late"]
        );
    }

    #[test]
    fn test_tie_breakers() {
        let ops = vec![op("B", 0, 100), op("A", 0, 100)];
        assert_eq!(order(&RuleEngine::earliest_start_first(), &ops), vec!["A", "B"]);

        let stable = RuleEngine::new().with_rule(rules::EarliestStart);
        assert_eq!(order(&stable, &ops), vec!["B", "A"]);
    }

    #[test]
    fn test_secondary_rule_only_breaks_ties() {
        let ops = vec![op("long", 0, 5_000), op("short", 0, 1_000), op("first", -1, 9_000)];
        let engine = RuleEngine::new()
            .with_rule(rules::EarliestStart)
            .with_rule(rules::Spt);
        assert_eq!(order(&engine, &ops), vec!["first", "short", "long"]);
    }

    #[test]
    fn test_weighted_mode() {
        let ops = vec![op("A", 10_000, 1_000), op("B", 2_000, 5_000)];
        let engine = RuleEngine::new()
            .with_mode(EvaluationMode::Weighted)
            .with_weighted_rule(rules::EarliestStart, 0.5)
            .with_weighted_rule(rules::Spt, 0.5);
        // A: 5500, B: 3500
        assert_eq!(order(&engine, &ops), vec!["B", "A"]);
    }

    #[test]
    fn test_select_from_subset() {
        let ops = vec![op("A", 0, 100), op("B", 500, 100), op("C", 200, 100)];
        let engine = RuleEngine::earliest_start_first();
        let context = SchedulingContext::at_time(0);
        assert_eq!(engine.sort_subset(&ops, &[1, 2], &context), vec![2, 1]);
        assert_eq!(engine.select(&ops, &[1, 2], &context), Some(2));
        assert_eq!(engine.select(&ops, &[], &context), None);
    }

    #[test]
    fn test_empty_operations() {
        let engine = RuleEngine::earliest_start_first();
        assert!(engine
            .sort_indices(&[], &SchedulingContext::at_time(0))
            .is_empty());
    }

    #[test]
    fn test_debug_lists_rules() {
        let engine = RuleEngine::earliest_start_first();
        assert_eq!(engine.rule_names(), vec!["FIFO"]);
        assert!(format!("{engine:?}").contains("FIFO(w=1)"));
    }
}
