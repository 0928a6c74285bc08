//! Input validation and schedule verification.
//!
//! [`validate_input`] checks the structural integrity of a scheduling day
//! before any search begins. Detects:
//! - Duplicate IDs (operations, docks, cranes, staff)
//! - Operations without candidate docks
//! - Non-positive or overflowing work, negative or inverted times
//! - Arrivals and planned departures past the horizon
//! - Required qualification codes that nobody knows
//! - Crane limits above what a candidate dock can supply
//!
//! Missing docks are NOT validation errors: the affected operations are
//! reported as infeasible by the strategies, so the rest of the day still
//! schedules.
//!
//! [`verify_schedule`] re-checks a finished schedule against the snapshot:
//! crane and berth capacity per dock, crane double-booking, staff overlap,
//! qualification and shift containment.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::config::DAY_MS;
use crate::models::{
    peak_overlap, OperationRequest, ResourceSnapshot, Schedule, TimeWindow, Violation,
};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// An operation lists no candidate dock.
    EmptyCandidates,
    /// Loading + unloading work is not positive.
    InvalidDuration,
    /// A time or window is negative or inverted.
    InvalidTime,
    /// A required qualification is neither catalogued nor held by any staff.
    UnknownQualification,
    /// Crane limit is zero or exceeds a candidate dock's compatible cranes.
    CraneLimitExceeded,
    /// Crew size is zero.
    InvalidCrew,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the input data for a scheduling day of [`DAY_MS`].
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(operations: &[OperationRequest], resources: &ResourceSnapshot) -> ValidationResult {
    validate_input_within(operations, resources, DAY_MS)
}

/// Validates the input data for a scheduling day ending at `horizon_ms`.
///
/// Operation times must lie in `[0, horizon_ms]`.
pub fn validate_input_within(
    operations: &[OperationRequest],
    resources: &ResourceSnapshot,
    horizon_ms: i64,
) -> ValidationResult {
    let mut errors = Vec::new();

    check_unique(
        resources.docks.iter().map(|d| d.code.as_str()),
        "dock code",
        &mut errors,
    );
    check_unique(
        resources
            .docks
            .iter()
            .flat_map(|d| d.cranes.iter().map(|c| c.id.as_str())),
        "crane ID",
        &mut errors,
    );
    check_unique(
        resources.staff.iter().map(|s| s.id.as_str()),
        "staff ID",
        &mut errors,
    );
    check_unique(
        operations.iter().map(|o| o.id.as_str()),
        "operation ID",
        &mut errors,
    );

    for member in &resources.staff {
        for window in member
            .calendar
            .shifts
            .iter()
            .chain(member.calendar.blocked_periods.iter())
        {
            if !window.is_valid() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidTime,
                    format!(
                        "Staff '{}' has an inverted window [{}, {})",
                        member.id, window.start_ms, window.end_ms
                    ),
                ));
            }
        }
    }

    for op in operations {
        validate_operation(op, resources, horizon_ms, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_operation(
    op: &OperationRequest,
    resources: &ResourceSnapshot,
    horizon_ms: i64,
    errors: &mut Vec<ValidationError>,
) {
    if op.candidate_docks.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyCandidates,
            format!("Operation '{}' has no candidate dock", op.id),
        ));
    }

    let work = op.loading_ms.checked_add(op.unloading_ms);
    if op.loading_ms < 0 || op.unloading_ms < 0 || work.map_or(true, |w| w <= 0) {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidDuration,
            format!(
                "Operation '{}' has invalid work (loading {} ms, unloading {} ms)",
                op.id, op.loading_ms, op.unloading_ms
            ),
        ));
    }

    if op.earliest_start_ms < 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidTime,
            format!("Operation '{}' starts before the scheduling day", op.id),
        ));
    } else if op.earliest_start_ms > horizon_ms {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidTime,
            format!(
                "Operation '{}' arrives at {} ms, after the horizon of {horizon_ms} ms",
                op.id, op.earliest_start_ms
            ),
        ));
    }

    if let Some(planned) = op.planned_departure_ms {
        if planned < op.earliest_start_ms {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTime,
                format!(
                    "Operation '{}' is planned to depart ({planned}) before it arrives ({})",
                    op.id, op.earliest_start_ms
                ),
            ));
        } else if planned > horizon_ms {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTime,
                format!(
                    "Operation '{}' is planned to depart at {planned} ms, after the horizon of {horizon_ms} ms",
                    op.id
                ),
            ));
        }
    }

    if op.crew_size == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidCrew,
            format!("Operation '{}' requires a crew of zero", op.id),
        ));
    }

    for code in &op.required_qualifications {
        if !resources.knows_qualification(code) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownQualification,
                format!("Operation '{}' requires unknown qualification '{}'", op.id, code),
            ));
        }
    }

    if let Some(limit) = op.max_cranes {
        if limit == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::CraneLimitExceeded,
                format!("Operation '{}' allows zero cranes", op.id),
            ));
        }
        for code in &op.candidate_docks {
            // Absent docks surface later as infeasibility.
            let Some(dock) = resources.dock(code) else {
                continue;
            };
            let available = dock
                .compatible_cranes(op.equipment_type.as_deref())
                .len() as u32;
            if available > 0 && limit > available {
                errors.push(ValidationError::new(
                    ValidationErrorKind::CraneLimitExceeded,
                    format!(
                        "Operation '{}' requests up to {limit} cranes but dock '{}' has {available}",
                        op.id, dock.code
                    ),
                ));
            }
        }
    }
}

fn check_unique<'a>(
    ids: impl Iterator<Item = &'a str>,
    label: &str,
    errors: &mut Vec<ValidationError>,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate {label}: {id}"),
            ));
        }
    }
}

/// Re-checks a schedule's hard invariants against the snapshot.
///
/// Returns every violation found; an empty vector means the schedule
/// respects crane, berth, staff-overlap, qualification and shift rules.
pub fn verify_schedule(
    schedule: &Schedule,
    operations: &[OperationRequest],
    resources: &ResourceSnapshot,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    // Dock capacity: berths and cranes.
    let mut by_dock: HashMap<&str, Vec<&crate::models::ScheduleAssignment>> = HashMap::new();
    for a in &schedule.assignments {
        by_dock.entry(a.dock_code.as_str()).or_default().push(a);
    }
    let mut dock_codes: Vec<&&str> = by_dock.keys().collect();
    dock_codes.sort();
    for code in dock_codes {
        let assignments = &by_dock[*code];
        let Some(dock) = resources.dock(code) else {
            violations.push(Violation::capacity_exceeded(
                *code,
                format!("Dock '{code}' is not in the snapshot"),
            ));
            continue;
        };
        for a in assignments {
            let concurrent: Vec<&crate::models::ScheduleAssignment> = assignments
                .iter()
                .copied()
                .filter(|b| b.window.overlaps(&a.window))
                .collect();
            let vessels = peak_overlap(concurrent.iter().map(|b| &b.window), &a.window);
            if vessels > dock.berths as usize {
                violations.push(Violation::capacity_exceeded(
                    dock.code.clone(),
                    format!(
                        "{vessels} vessels at dock '{}' during operation '{}' (berths: {})",
                        dock.code, a.operation_id, dock.berths
                    ),
                ));
            }
            let cranes = peak_cranes(&concurrent, &a.window);
            if cranes > dock.crane_count() {
                violations.push(Violation::capacity_exceeded(
                    dock.code.clone(),
                    format!(
                        "{cranes} cranes in use at dock '{}' during operation '{}' (installed: {})",
                        dock.code,
                        a.operation_id,
                        dock.crane_count()
                    ),
                ));
            }
        }
    }

    // Individual cranes.
    let mut crane_windows: HashMap<&str, Vec<(&str, TimeWindow)>> = HashMap::new();
    for a in &schedule.assignments {
        for crane in &a.crane_ids {
            crane_windows
                .entry(crane.as_str())
                .or_default()
                .push((a.operation_id.as_str(), a.window));
        }
    }
    for (crane, windows) in sorted_entries(&crane_windows) {
        for (first, second) in overlapping_pairs(windows) {
            violations.push(Violation::capacity_exceeded(
                crane,
                format!("Crane '{crane}' double-booked by '{first}' and '{second}'"),
            ));
        }
    }

    // Staff overlap, qualifications, shift containment.
    let ops_by_id: HashMap<&str, &OperationRequest> =
        operations.iter().map(|o| (o.id.as_str(), o)).collect();
    let mut staff_windows: HashMap<&str, Vec<(&str, TimeWindow)>> = HashMap::new();
    for a in &schedule.assignments {
        for s in &a.staff {
            staff_windows
                .entry(s.staff_id.as_str())
                .or_default()
                .push((s.operation_id.as_str(), s.window));

            let Some(member) = resources.staff_member(&s.staff_id) else {
                violations.push(Violation::skill_mismatch(
                    s.staff_id.clone(),
                    format!("Staff '{}' is not in the snapshot", s.staff_id),
                ));
                continue;
            };
            if let Some(op) = ops_by_id.get(a.operation_id.as_str()) {
                if !member.is_qualified_for(&op.required_qualifications) {
                    violations.push(Violation::skill_mismatch(
                        member.id.clone(),
                        format!(
                            "Staff '{}' lacks qualifications for '{}'",
                            member.id, op.id
                        ),
                    ));
                }
            }
            if !member.calendar.can_work(&s.window) {
                violations.push(Violation::shift_overrun(
                    member.id.clone(),
                    format!(
                        "Staff '{}' rostered outside a shift for '{}'",
                        member.id, a.operation_id
                    ),
                ));
            }
        }
    }
    for (staff, windows) in sorted_entries(&staff_windows) {
        for (first, second) in overlapping_pairs(windows) {
            violations.push(Violation::staff_conflict(
                staff,
                format!("Staff '{staff}' assigned to both '{first}' and '{second}'"),
            ));
        }
    }

    violations
}

/// Peak crane usage among `assignments` inside `window`.
fn peak_cranes(assignments: &[&crate::models::ScheduleAssignment], window: &TimeWindow) -> u32 {
    let mut events: Vec<(i64, i64)> = Vec::new();
    for a in assignments {
        if a.window.overlaps(window) {
            let count = a.crane_count() as i64;
            events.push((a.window.start_ms.max(window.start_ms), count));
            events.push((a.window.end_ms.min(window.end_ms), -count));
        }
    }
    events.sort();
    let mut current = 0i64;
    let mut peak = 0i64;
    for (_, delta) in events {
        current += delta;
        peak = peak.max(current);
    }
    peak as u32
}

fn sorted_entries<'a, V>(map: &'a HashMap<&'a str, V>) -> Vec<(&'a str, &'a V)> {
    let mut entries: Vec<(&str, &V)> = map.iter().map(|(k, v)| (*k, v)).collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

fn overlapping_pairs<'a>(windows: &'a [(&'a str, TimeWindow)]) -> Vec<(&'a str, &'a str)> {
    let mut pairs = Vec::new();
    for (i, (op_a, wa)) in windows.iter().enumerate() {
        for (op_b, wb) in &windows[i + 1..] {
            if wa.overlaps(wb) {
                pairs.push((*op_a, *op_b));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dock, ScheduleAssignment, StaffAssignment, StaffMember};

    fn sample_resources() -> ResourceSnapshot {
        ResourceSnapshot::new()
            .with_dock(
                Dock::new("D1")
                    .with_berths(2)
                    .with_crane("C1", "STS")
                    .with_crane("C2", "STS"),
            )
            .with_dock(Dock::new("D2").with_crane("M1", "mobile"))
            .with_staff(
                StaffMember::new("S1")
                    .with_qualification("crane-op")
                    .with_shift(0, 28_800_000),
            )
            .with_staff(
                StaffMember::new("S2")
                    .with_qualification("crane-op")
                    .with_shift(0, 28_800_000),
            )
    }

    fn sample_operations() -> Vec<OperationRequest> {
        vec![
            OperationRequest::new("OP1", "V1", "D1")
                .with_work(3_600_000, 3_600_000)
                .with_equipment("STS")
                .with_qualification("crane-op")
                .with_max_cranes(2),
            OperationRequest::new("OP2", "V2", "D2").with_work(1_800_000, 0),
        ]
    }

    #[test]
    fn test_valid_input() {
        assert!(validate_input(&sample_operations(), &sample_resources()).is_ok());
    }

    #[test]
    fn test_empty_input_is_valid() {
        assert!(validate_input(&[], &ResourceSnapshot::new()).is_ok());
    }

    #[test]
    fn test_duplicate_operation_id() {
        let mut ops = sample_operations();
        ops[1].id = "OP1".into();

        let errors = validate_input(&ops, &sample_resources()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("operation")));
    }

    #[test]
    fn test_duplicate_crane_across_docks() {
        let resources = sample_resources().with_dock(Dock::new("D3").with_crane("C1", "STS"));

        let errors = validate_input(&sample_operations(), &resources).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("crane")));
    }

    #[test]
    fn test_unknown_qualification() {
        let ops = vec![OperationRequest::new("OP1", "V1", "D1")
            .with_work(1_000, 0)
            .with_qualification("deep-sea-diver")];

        let errors = validate_input(&ops, &sample_resources()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::UnknownQualification));
    }

    #[test]
    fn test_crane_limit_exceeds_dock() {
        let ops = vec![OperationRequest::new("OP1", "V1", "D1")
            .with_work(1_000, 0)
            .with_equipment("STS")
            .with_max_cranes(3)];

        let errors = validate_input(&ops, &sample_resources()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::CraneLimitExceeded));
    }

    #[test]
    fn test_missing_dock_is_not_an_error() {
        let ops = vec![OperationRequest::new("OP1", "V1", "NOWHERE")
            .with_work(1_000, 0)
            .with_max_cranes(2)];
        assert!(validate_input(&ops, &sample_resources()).is_ok());
    }

    #[test]
    fn test_bad_times_and_work() {
        let ops = vec![
            OperationRequest::new("OP1", "V1", "D1").with_work(0, 0),
            OperationRequest::new("OP2", "V2", "D1")
                .with_work(1_000, 0)
                .with_earliest_start(5_000)
                .with_planned_departure(4_000),
            OperationRequest::new("OP3", "V3", "D1")
                .with_work(1_000, 0)
                .with_crew_size(0),
        ];
        let errors = validate_input(&ops, &sample_resources()).unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::InvalidDuration));
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::InvalidTime));
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::InvalidCrew));
    }

    #[test]
    fn test_times_beyond_horizon() {
        let ops = vec![
            OperationRequest::new("LATE", "V1", "D1")
                .with_work(1_000, 0)
                .with_earliest_start(i64::MAX - 10),
            OperationRequest::new("HUGE", "V2", "D1").with_work(i64::MAX, 1),
            OperationRequest::new("NEXTDAY", "V3", "D1")
                .with_work(1_000, 0)
                .with_planned_departure(DAY_MS + 1),
        ];
        let errors = validate_input(&ops, &sample_resources()).unwrap_err();
        for id in ["LATE", "HUGE", "NEXTDAY"] {
            assert!(errors.iter().any(|e| e.message.contains(id)), "{id}");
        }
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidDuration && e.message.contains("HUGE")));

        let within_short_day = vec![OperationRequest::new("OP1", "V1", "D1")
            .with_work(1_000, 0)
            .with_earliest_start(5_000)];
        assert!(validate_input_within(&within_short_day, &sample_resources(), 10_000).is_ok());
        assert!(validate_input_within(&within_short_day, &sample_resources(), 4_000).is_err());
    }

    #[test]
    fn test_empty_candidates() {
        let mut op = OperationRequest::new("OP1", "V1", "D1").with_work(1_000, 0);
        op.candidate_docks.clear();
        let errors = validate_input(&[op], &sample_resources()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::EmptyCandidates));
    }

    fn placed(op: &str, dock: &str, cranes: &[&str], staff: &str, start: i64, end: i64) -> ScheduleAssignment {
        let window = TimeWindow::new(start, end);
        ScheduleAssignment {
            operation_id: op.into(),
            vessel_id: format!("V-{op}"),
            dock_code: dock.into(),
            crane_ids: cranes.iter().map(|c| c.to_string()).collect(),
            duration_ms: end - start,
            window,
            staff: vec![StaffAssignment::new(staff, op, window)],
            planned_departure_ms: end,
            departure_ms: end,
            delay_ms: 0,
        }
    }

    #[test]
    fn test_verify_clean_schedule() {
        let mut schedule = Schedule::new("test");
        schedule.add_assignment(placed("OP1", "D1", &["C1"], "S1", 0, 1_000));
        schedule.add_assignment(placed("OP2", "D1", &["C2"], "S2", 0, 1_000));

        let v = verify_schedule(&schedule, &sample_operations(), &sample_resources());
        assert!(v.is_empty(), "{v:?}");
    }

    #[test]
    fn test_verify_detects_conflicts() {
        let mut schedule = Schedule::new("test");
        schedule.add_assignment(placed("OP1", "D1", &["C1", "C2"], "S1", 0, 1_000));
        schedule.add_assignment(placed("OP2", "D1", &["C2"], "S1", 500, 1_500));

        let v = verify_schedule(&schedule, &sample_operations(), &sample_resources());
        use crate::models::ViolationType;
        assert!(v.iter().any(|x| x.violation_type == ViolationType::StaffConflict));
        assert!(v.iter().any(|x| x.violation_type == ViolationType::CapacityExceeded
            && x.entity_id == "C2"));
        // 3 cranes at a 2-crane dock
        assert!(v.iter().any(|x| x.violation_type == ViolationType::CapacityExceeded
            && x.entity_id == "D1"));
    }
}
