//! Qualification- and shift-aware crew matching.
//!
//! # Rules
//!
//! A staff member can work an operation window when:
//! 1. their qualifications are a superset of the operation's requirements,
//! 2. one shift fully contains the window and no blocked period touches it,
//! 3. no committed assignment of theirs overlaps the window.
//!
//! Among eligible staff the matcher prefers the fewest assignments so far in
//! the run, then the smallest staff ID.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::{
    InfeasibilityReason, OperationRequest, ResourceSnapshot, StaffAssignment, StaffMember,
    TimeWindow,
};

/// Staff windows committed so far in one run.
///
/// Per-member timelines are shared between clones until written.
#[derive(Debug, Clone, Default)]
pub struct StaffLedger {
    committed: BTreeMap<String, Arc<Vec<TimeWindow>>>,
}

impl StaffLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `staff_id` has nothing committed that overlaps `window`.
    pub fn is_free(&self, staff_id: &str, window: &TimeWindow) -> bool {
        self.committed
            .get(staff_id)
            .map_or(true, |ws| !ws.iter().any(|w| w.overlaps(window)))
    }

    /// Number of assignments committed for `staff_id`.
    pub fn load(&self, staff_id: &str) -> usize {
        self.committed.get(staff_id).map_or(0, |ws| ws.len())
    }

    /// Committed windows of `staff_id`.
    pub fn windows(&self, staff_id: &str) -> &[TimeWindow] {
        self.committed
            .get(staff_id)
            .map_or(&[], |ws| ws.as_slice())
    }

    /// Records a staff assignment.
    pub fn commit(&mut self, assignment: &StaffAssignment) {
        let windows = self
            .committed
            .entry(assignment.staff_id.clone())
            .or_default();
        Arc::make_mut(windows).push(assignment.window);
    }
}

/// Finds crews for operation windows.
#[derive(Debug, Clone, Copy)]
pub struct StaffMatcher<'a> {
    resources: &'a ResourceSnapshot,
}

impl<'a> StaffMatcher<'a> {
    /// Creates a matcher over the snapshot's staff.
    pub fn new(resources: &'a ResourceSnapshot) -> Self {
        Self { resources }
    }

    /// Staff holding every qualification `operation` requires, by ID.
    pub fn qualified(&self, operation: &OperationRequest) -> Vec<&'a StaffMember> {
        let mut staff: Vec<&StaffMember> = self
            .resources
            .staff
            .iter()
            .filter(|s| s.is_qualified_for(&operation.required_qualifications))
            .collect();
        staff.sort_by(|a, b| a.id.cmp(&b.id));
        staff
    }

    /// Finds one staff member for `window`, skipping IDs in `exclude`.
    ///
    /// # Errors
    /// - `NoQualifiedStaff`: nobody holds the qualifications.
    /// - `NoStaffOnShift`: qualified staff exist but no shift covers `window`.
    /// - `CapacityExhausted`: every covering member is already busy.
    pub fn find(
        &self,
        operation: &OperationRequest,
        window: &TimeWindow,
        ledger: &StaffLedger,
        exclude: &[&str],
    ) -> Result<StaffAssignment, InfeasibilityReason> {
        let qualified: Vec<&StaffMember> = self
            .qualified(operation)
            .into_iter()
            .filter(|s| !exclude.contains(&s.id.as_str()))
            .collect();
        if qualified.is_empty() {
            return Err(InfeasibilityReason::NoQualifiedStaff);
        }

        let on_shift: Vec<&StaffMember> = qualified
            .into_iter()
            .filter(|s| s.calendar.can_work(window))
            .collect();
        if on_shift.is_empty() {
            return Err(InfeasibilityReason::NoStaffOnShift);
        }

        on_shift
            .into_iter()
            .filter(|s| ledger.is_free(&s.id, window))
            .min_by(|a, b| {
                ledger
                    .load(&a.id)
                    .cmp(&ledger.load(&b.id))
                    .then_with(|| a.id.cmp(&b.id))
            })
            .map(|s| StaffAssignment::new(s.id.clone(), operation.id.clone(), *window))
            .ok_or(InfeasibilityReason::CapacityExhausted)
    }

    /// Selects `operation.crew_size` distinct staff for `window`.
    ///
    /// Repeats [`find`](Self::find), excluding members already picked, and
    /// returns the reason of the first pick that fails.
    pub fn match_crew(
        &self,
        operation: &OperationRequest,
        window: &TimeWindow,
        ledger: &StaffLedger,
    ) -> Result<Vec<StaffAssignment>, InfeasibilityReason> {
        let mut crew: Vec<StaffAssignment> = Vec::with_capacity(operation.crew_size as usize);
        for _ in 0..operation.crew_size {
            let picked: Vec<&str> = crew.iter().map(|a| a.staff_id.as_str()).collect();
            let member = self.find(operation, window, ledger, &picked)?;
            crew.push(member);
        }
        Ok(crew)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Dock;

    const H: i64 = 3_600_000;

    fn resources() -> ResourceSnapshot {
        ResourceSnapshot::new()
            .with_dock(Dock::new("D1").with_crane("C1", "STS"))
            .with_staff(
                StaffMember::new("S2")
                    .with_qualification("crane-op")
                    .with_shift(0, 8 * H),
            )
            .with_staff(
                StaffMember::new("S1")
                    .with_qualification("crane-op")
                    .with_shift(0, 8 * H)
                    .with_blocked(4 * H, 5 * H),
            )
            .with_staff(
                StaffMember::new("S3")
                    .with_qualification("lashing")
                    .with_shift(8 * H, 16 * H),
            )
    }

    fn op() -> OperationRequest {
        OperationRequest::new("OP1", "V1", "D1")
            .with_work(2 * H, 0)
            .with_qualification("crane-op")
    }

    #[test]
    fn test_find_prefers_lowest_id() {
        let res = resources();
        let matcher = StaffMatcher::new(&res);
        let a = matcher
            .find(&op(), &TimeWindow::new(0, 2 * H), &StaffLedger::new(), &[])
            .unwrap();
        assert_eq!(a.staff_id, "S1");
        assert_eq!(a.operation_id, "OP1");
    }

    #[test]
    fn test_find_prefers_least_loaded() {
        let res = resources();
        let matcher = StaffMatcher::new(&res);
        let mut ledger = StaffLedger::new();
        ledger.commit(&StaffAssignment::new("S1", "OP0", TimeWindow::new(6 * H, 7 * H)));
        let a = matcher
            .find(&op(), &TimeWindow::new(0, 2 * H), &ledger, &[])
            .unwrap();
        assert_eq!(a.staff_id, "S2");
    }

    #[test]
    fn test_blocked_period_excludes_member() {
        let res = resources();
        let matcher = StaffMatcher::new(&res);
        let a = matcher
            .find(&op(), &TimeWindow::new(3 * H, 5 * H), &StaffLedger::new(), &[])
            .unwrap();
        assert_eq!(a.staff_id, "S2");
    }

    #[test]
    fn test_reasons() {
        let res = resources();
        let matcher = StaffMatcher::new(&res);
        let ledger = StaffLedger::new();

        let unknown = op().with_qualification("pilot");
        assert_eq!(
            matcher.find(&unknown, &TimeWindow::new(0, H), &ledger, &[]),
            Err(InfeasibilityReason::NoQualifiedStaff)
        );
        assert_eq!(
            matcher.find(&op(), &TimeWindow::new(7 * H, 9 * H), &ledger, &[]),
            Err(InfeasibilityReason::NoStaffOnShift)
        );

        let mut busy = StaffLedger::new();
        busy.commit(&StaffAssignment::new("S1", "X", TimeWindow::new(0, H)));
        busy.commit(&StaffAssignment::new("S2", "Y", TimeWindow::new(0, H)));
        assert_eq!(
            matcher.find(&op(), &TimeWindow::new(0, H), &busy, &[]),
            Err(InfeasibilityReason::CapacityExhausted)
        );
    }

    #[test]
    fn test_match_crew() {
        let res = resources();
        let matcher = StaffMatcher::new(&res);
        let ledger = StaffLedger::new();
        let window = TimeWindow::new(0, 2 * H);

        let crew = matcher
            .match_crew(&op().with_crew_size(2), &window, &ledger)
            .unwrap();
        let ids: Vec<&str> = crew.iter().map(|a| a.staff_id.as_str()).collect();
        assert_eq!(ids, vec!["S1", "S2"]);

        assert_eq!(
            matcher.match_crew(&op().with_crew_size(3), &window, &ledger),
            Err(InfeasibilityReason::NoQualifiedStaff)
        );
    }

    #[test]
    fn test_ledger_is_copy_on_write() {
        let mut ledger = StaffLedger::new();
        ledger.commit(&StaffAssignment::new("S1", "A", TimeWindow::new(0, H)));
        let mut branch = ledger.clone();
        branch.commit(&StaffAssignment::new("S1", "B", TimeWindow::new(H, 2 * H)));
        assert_eq!(ledger.load("S1"), 1);
        assert_eq!(branch.load("S1"), 2);
        assert!(!branch.is_free("S1", &TimeWindow::new(H, 2 * H)));
        assert!(ledger.is_free("S1", &TimeWindow::new(H, 2 * H)));
    }
}
