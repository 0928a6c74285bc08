//! Schedule delay metrics (KPIs).
//!
//! Summary figures that make schedules from different strategies
//! comparable.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Total Delay | Sum of max(0, departure - planned departure) |
//! | Maximum Delay | Largest single delay |
//! | Delayed Operations | Assignments with delay > 0 |
//! | Unassigned | Operations marked infeasible |
//! | On-Time Rate | Fraction of assignments without delay |
//! | Makespan | Latest departure |
//! | Dock Utilization | Worked time at a dock / makespan |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::Schedule;

/// Delay indicators for one schedule.
///
/// All time values are in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayMetric {
    /// Sum of delays across all assignments (ms).
    pub total_delay_ms: i64,
    /// Maximum delay of any single assignment (ms).
    pub max_delay_ms: i64,
    /// Number of assignments departing late.
    pub delayed_operations: usize,
    /// Number of operations left unassigned.
    pub unassigned_operations: usize,
    /// Fraction of assignments departing on time (0.0..1.0).
    pub on_time_rate: f64,
    /// Latest departure (ms).
    pub makespan_ms: i64,
    /// Worked time per dock relative to makespan.
    pub utilization_by_dock: BTreeMap<String, f64>,
}

impl DelayMetric {
    /// Computes metrics from a schedule.
    pub fn calculate(schedule: &Schedule) -> Self {
        let makespan = schedule.makespan_ms();
        let delayed = schedule
            .assignments
            .iter()
            .filter(|a| a.delay_ms > 0)
            .count();

        let mut busy: BTreeMap<String, i64> = BTreeMap::new();
        for a in &schedule.assignments {
            *busy.entry(a.dock_code.clone()).or_default() += a.window.duration_ms();
        }
        let utilization_by_dock = busy
            .into_iter()
            .map(|(dock, worked)| {
                let u = if makespan > 0 {
                    worked as f64 / makespan as f64
                } else {
                    0.0
                };
                (dock, u)
            })
            .collect();

        let assigned = schedule.assignments.len();
        let on_time_rate = if assigned == 0 {
            1.0
        } else {
            (assigned - delayed) as f64 / assigned as f64
        };

        Self {
            total_delay_ms: schedule.total_delay_ms(),
            max_delay_ms: schedule.max_delay_ms(),
            delayed_operations: delayed,
            unassigned_operations: schedule.unassigned.len(),
            on_time_rate,
            makespan_ms: makespan,
            utilization_by_dock,
        }
    }

    /// Mean dock utilization (0 when nothing was placed).
    pub fn avg_utilization(&self) -> f64 {
        if self.utilization_by_dock.is_empty() {
            0.0
        } else {
            self.utilization_by_dock.values().sum::<f64>() / self.utilization_by_dock.len() as f64
        }
    }

    /// Whether every operation was placed and no delay exceeds `max_delay_ms`.
    pub fn meets_thresholds(&self, max_delay_ms: i64) -> bool {
        self.unassigned_operations == 0 && self.max_delay_ms <= max_delay_ms
    }
}
