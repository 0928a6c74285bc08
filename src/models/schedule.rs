//! Schedule (solution) model.
//!
//! A schedule is one strategy's answer for a scheduling day: one
//! assignment per placed operation, an infeasibility marker per operation
//! that could not be placed, and any contention detected while replaying
//! resource timelines.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::TimeWindow;

/// A staff member rostered onto an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffAssignment {
    /// Staff member.
    pub staff_id: String,
    /// Operation worked.
    pub operation_id: String,
    /// Rostered interval.
    pub window: TimeWindow,
}

/// Placement of one operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleAssignment {
    /// Operation placed.
    pub operation_id: String,
    /// Vessel (denormalized for presentation).
    pub vessel_id: String,
    /// Dock the vessel is worked at.
    pub dock_code: String,
    /// Cranes allotted (sorted by id).
    pub crane_ids: Vec<String>,
    /// Optimized duration for the allotted crane count (ms).
    pub duration_ms: i64,
    /// Work window.
    pub window: TimeWindow,
    /// Crew.
    pub staff: Vec<StaffAssignment>,
    /// Originally scheduled departure (ms).
    pub planned_departure_ms: i64,
    /// Realistic departure after contention (ms).
    pub departure_ms: i64,
    /// `max(0, departure - planned departure)` (ms).
    pub delay_ms: i64,
}

/// Why an operation could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfeasibilityReason {
    /// None of the candidate docks exists in the snapshot.
    UnknownDock,
    /// No candidate dock has a crane of the required type.
    NoCompatibleEquipment,
    /// Nobody holds the required qualifications.
    NoQualifiedStaff,
    /// Qualified staff exist but no shift can contain the work.
    NoStaffOnShift,
    /// Every feasible slot within the day is taken.
    CapacityExhausted,
}

/// An operation left without assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnassignedOperation {
    /// Operation id.
    pub operation_id: String,
    /// Reason code.
    pub reason: InfeasibilityReason,
}

/// A constraint violation or contention event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Related entity ID (operation, dock, crane, or staff).
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
    /// Severity (0-100, higher = worse).
    pub severity: i32,
}

/// Classification of constraint violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// Operation start pushed back by a held resource.
    ResourceContention,
    /// A pushed staff interval no longer fits inside its shift.
    ShiftOverrun,
    /// Dock berths or cranes allocated beyond capacity.
    CapacityExceeded,
    /// A staff member holds overlapping assignments.
    StaffConflict,
    /// Staff lacks a required qualification.
    SkillMismatch,
}

/// How far a schedule can be trusted to be optimal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Optimality {
    /// Produced by a heuristic; no claim.
    #[default]
    Heuristic,
    /// Search space exhausted.
    Proven,
    /// Best found before the search was stopped.
    NotProven {
        /// Why the search stopped.
        reason: String,
    },
}

/// A complete schedule for one day, produced by one strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Producing strategy.
    pub strategy: String,
    /// Placements ordered by (start, operation id).
    pub assignments: Vec<ScheduleAssignment>,
    /// Operations that could not be placed.
    pub unassigned: Vec<UnassignedOperation>,
    /// Contention and constraint violations.
    pub violations: Vec<Violation>,
    /// Optimality claim.
    pub optimality: Optimality,
}

impl StaffAssignment {
    /// Creates a staff assignment.
    pub fn new(
        staff_id: impl Into<String>,
        operation_id: impl Into<String>,
        window: TimeWindow,
    ) -> Self {
        Self {
            staff_id: staff_id.into(),
            operation_id: operation_id.into(),
            window,
        }
    }
}

impl ScheduleAssignment {
    /// Crane count used.
    #[inline]
    pub fn crane_count(&self) -> u32 {
        self.crane_ids.len() as u32
    }

    /// Start time (ms).
    #[inline]
    pub fn start_ms(&self) -> i64 {
        self.window.start_ms
    }

    /// End time (ms).
    #[inline]
    pub fn end_ms(&self) -> i64 {
        self.window.end_ms
    }
}

impl fmt::Display for InfeasibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::UnknownDock => "no candidate dock exists",
            Self::NoCompatibleEquipment => "no compatible crane at any candidate dock",
            Self::NoQualifiedStaff => "no staff holds the required qualifications",
            Self::NoStaffOnShift => "no qualified staff shift can contain the work",
            Self::CapacityExhausted => "no free slot left within the day",
        };
        f.write_str(text)
    }
}

impl Violation {
    /// Creates a contention event.
    pub fn contention(operation_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::ResourceContention,
            entity_id: operation_id.into(),
            message: message.into(),
            severity: 40,
        }
    }

    /// Creates a shift overrun violation.
    pub fn shift_overrun(staff_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::ShiftOverrun,
            entity_id: staff_id.into(),
            message: message.into(),
            severity: 70,
        }
    }

    /// Creates a capacity exceeded violation.
    pub fn capacity_exceeded(resource_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::CapacityExceeded,
            entity_id: resource_id.into(),
            message: message.into(),
            severity: 90,
        }
    }

    /// Creates a staff conflict violation.
    pub fn staff_conflict(staff_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::StaffConflict,
            entity_id: staff_id.into(),
            message: message.into(),
            severity: 95,
        }
    }

    /// Creates a skill mismatch violation.
    pub fn skill_mismatch(staff_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violation_type: ViolationType::SkillMismatch,
            entity_id: staff_id.into(),
            message: message.into(),
            severity: 85,
        }
    }
}

impl Optimality {
    /// Whether optimality was proven.
    pub fn is_proven(&self) -> bool {
        matches!(self, Self::Proven)
    }
}

impl Schedule {
    /// Creates an empty schedule for a strategy.
    pub fn new(strategy: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            ..Self::default()
        }
    }

    /// Adds an assignment.
    pub fn add_assignment(&mut self, assignment: ScheduleAssignment) {
        self.assignments.push(assignment);
    }

    /// Marks an operation as infeasible.
    pub fn add_unassigned(&mut self, operation_id: impl Into<String>, reason: InfeasibilityReason) {
        self.unassigned.push(UnassignedOperation {
            operation_id: operation_id.into(),
            reason,
        });
    }

    /// Adds a violation.
    pub fn add_violation(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Orders assignments by (start, operation id) and unassigned by id.
    pub fn normalize(&mut self) {
        self.assignments.sort_by(|a, b| {
            a.window
                .start_ms
                .cmp(&b.window.start_ms)
                .then_with(|| a.operation_id.cmp(&b.operation_id))
        });
        self.unassigned
            .sort_by(|a, b| a.operation_id.cmp(&b.operation_id));
    }

    /// Whether nothing was scheduled or rejected.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty() && self.unassigned.is_empty()
    }

    /// Whether every operation was placed without contention.
    pub fn is_clean(&self) -> bool {
        self.unassigned.is_empty() && self.violations.is_empty()
    }

    /// Sum of per-operation delay (ms).
    pub fn total_delay_ms(&self) -> i64 {
        self.assignments.iter().map(|a| a.delay_ms).sum()
    }

    /// Largest single-operation delay (ms).
    pub fn max_delay_ms(&self) -> i64 {
        self.assignments
            .iter()
            .map(|a| a.delay_ms)
            .max()
            .unwrap_or(0)
    }

    /// Latest departure across all assignments (ms).
    pub fn makespan_ms(&self) -> i64 {
        self.assignments
            .iter()
            .map(|a| a.departure_ms)
            .max()
            .unwrap_or(0)
    }

    /// Finds the assignment for an operation.
    pub fn assignment_for(&self, operation_id: &str) -> Option<&ScheduleAssignment> {
        self.assignments
            .iter()
            .find(|a| a.operation_id == operation_id)
    }

    /// Finds the infeasibility marker for an operation.
    pub fn unassigned_reason(&self, operation_id: &str) -> Option<InfeasibilityReason> {
        self.unassigned
            .iter()
            .find(|u| u.operation_id == operation_id)
            .map(|u| u.reason)
    }

    /// Returns all assignments at a dock.
    pub fn assignments_at_dock(&self, dock_code: &str) -> Vec<&ScheduleAssignment> {
        self.assignments
            .iter()
            .filter(|a| a.dock_code == dock_code)
            .collect()
    }

    /// Returns every staff assignment of a staff member.
    pub fn staff_assignments_for(&self, staff_id: &str) -> Vec<&StaffAssignment> {
        self.assignments
            .iter()
            .flat_map(|a| a.staff.iter())
            .filter(|s| s.staff_id == staff_id)
            .collect()
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(op: &str, dock: &str, start: i64, end: i64, delay: i64) -> ScheduleAssignment {
        ScheduleAssignment {
            operation_id: op.into(),
            vessel_id: format!("V-{op}"),
            dock_code: dock.into(),
            crane_ids: vec!["C1".into()],
            duration_ms: end - start,
            window: TimeWindow::new(start, end),
            staff: vec![StaffAssignment::new("S1", op, TimeWindow::new(start, end))],
            planned_departure_ms: end - delay,
            departure_ms: end,
            delay_ms: delay,
        }
    }

    fn sample_schedule() -> Schedule {
        let mut s = Schedule::new("greedy");
        s.add_assignment(assignment("OP2", "D1", 5_000, 8_000, 3_000));
        s.add_assignment(assignment("OP1", "D1", 0, 5_000, 0));
        s.add_assignment(assignment("OP3", "D2", 1_000, 4_000, 500));
        s
    }

    #[test]
    fn test_delay_totals() {
        let s = sample_schedule();
        assert_eq!(s.total_delay_ms(), 3_500);
        assert_eq!(s.max_delay_ms(), 3_000);
        assert_eq!(s.makespan_ms(), 8_000);
    }

    #[test]
    fn test_normalize_orders_by_start() {
        let mut s = sample_schedule();
        s.add_unassigned("OP9", InfeasibilityReason::UnknownDock);
        s.add_unassigned("OP8", InfeasibilityReason::NoQualifiedStaff);
        s.normalize();

        let order: Vec<&str> = s.assignments.iter().map(|a| a.operation_id.as_str()).collect();
        assert_eq!(order, vec!["OP1", "OP3", "OP2"]);
        assert_eq!(s.unassigned[0].operation_id, "OP8");
    }

    #[test]
    fn test_lookups() {
        let mut s = sample_schedule();
        s.add_unassigned("OP9", InfeasibilityReason::CapacityExhausted);

        assert_eq!(s.assignment_for("OP3").unwrap().dock_code, "D2");
        assert!(s.assignment_for("OP9").is_none());
        assert_eq!(
            s.unassigned_reason("OP9"),
            Some(InfeasibilityReason::CapacityExhausted)
        );
        assert_eq!(s.assignments_at_dock("D1").len(), 2);
        assert_eq!(s.staff_assignments_for("S1").len(), 3);
        assert!(!s.is_clean());
    }

    #[test]
    fn test_empty_schedule() {
        let s = Schedule::new("optimal");
        assert!(s.is_empty());
        assert!(s.is_clean());
        assert_eq!(s.total_delay_ms(), 0);
        assert_eq!(s.max_delay_ms(), 0);
        assert_eq!(s.makespan_ms(), 0);
        assert_eq!(s.optimality, Optimality::Heuristic);
    }

    #[test]
    fn test_violation_factories() {
        let v1 = Violation::contention("OP1", "pushed");
        assert_eq!(v1.violation_type, ViolationType::ResourceContention);
        assert_eq!(v1.entity_id, "OP1");

        let v2 = Violation::capacity_exceeded("D1", "3 cranes > 2");
        assert_eq!(v2.violation_type, ViolationType::CapacityExceeded);

        let v3 = Violation::shift_overrun("S1", "past shift end");
        assert_eq!(v3.violation_type, ViolationType::ShiftOverrun);

        assert_eq!(
            Violation::staff_conflict("S1", "x").violation_type,
            ViolationType::StaffConflict
        );
        assert_eq!(
            Violation::skill_mismatch("S1", "x").violation_type,
            ViolationType::SkillMismatch
        );
    }

    #[test]
    fn test_optimality_serde() {
        let json = serde_json::to_string(&Optimality::NotProven {
            reason: "node budget".into(),
        })
        .unwrap();
        assert!(json.contains("not_proven"));
        assert!(Optimality::Proven.is_proven());
        assert!(!Optimality::Heuristic.is_proven());
    }
}
