//! Delay propagation over resource timelines.
//!
//! # Algorithm
//!
//! 1. Replay assignments in (start, operation id) order.
//! 2. Before committing an assignment, push its start to the earliest end
//!    of any window still holding a berth, crane or staff member it needs;
//!    repeat until every resource is free.
//! 3. Shift the crew with the operation; flag crews pushed out of shift.
//! 4. Departure = end, delay = `max(0, departure - planned departure)`.
//!
//! Pushes cascade: a delayed assignment occupies its resources later and
//! may in turn push the assignments behind it.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::models::{peak_overlap, ResourceSnapshot, Schedule, TimeWindow, Violation};

/// Replays a schedule and fills realistic departures and delays.
#[derive(Debug, Clone, Copy)]
pub struct DelayPropagator<'a> {
    resources: &'a ResourceSnapshot,
}

impl<'a> DelayPropagator<'a> {
    /// Creates a propagator over the snapshot's docks and staff calendars.
    pub fn new(resources: &'a ResourceSnapshot) -> Self {
        Self { resources }
    }

    /// Returns `schedule` with contention resolved and delays filled.
    ///
    /// A schedule without contention comes back with unchanged windows.
    pub fn propagate(&self, mut schedule: Schedule) -> Schedule {
        schedule.normalize();

        let mut berths: HashMap<String, Vec<TimeWindow>> = HashMap::new();
        let mut cranes: HashMap<String, Vec<TimeWindow>> = HashMap::new();
        let mut staff: HashMap<String, Vec<TimeWindow>> = HashMap::new();
        let mut violations = Vec::new();

        for assignment in &mut schedule.assignments {
            let capacity = self
                .resources
                .dock(&assignment.dock_code)
                .map_or(1, |d| d.berths.max(1)) as usize;
            let original_start = assignment.window.start_ms;
            let duration = assignment.window.duration_ms();
            let mut window = assignment.window;

            loop {
                let mut blocking: Vec<&TimeWindow> = Vec::new();

                let dock_windows = berths
                    .get(&assignment.dock_code)
                    .map_or(&[][..], |ws| ws.as_slice());
                if peak_overlap(dock_windows.iter(), &window) >= capacity {
                    blocking.extend(dock_windows.iter().filter(|w| w.overlaps(&window)));
                }
                for crane in &assignment.crane_ids {
                    if let Some(ws) = cranes.get(crane) {
                        blocking.extend(ws.iter().filter(|w| w.overlaps(&window)));
                    }
                }
                for member in &assignment.staff {
                    if let Some(ws) = staff.get(&member.staff_id) {
                        blocking.extend(ws.iter().filter(|w| w.overlaps(&window)));
                    }
                }

                match blocking.iter().map(|w| w.end_ms).min() {
                    Some(next) => window = TimeWindow::starting_at(next, duration),
                    None => break,
                }
            }

            let pushed = window.start_ms - original_start;
            if pushed > 0 {
                debug!(
                    operation = %assignment.operation_id,
                    pushed_ms = pushed,
                    "resource contention"
                );
                violations.push(Violation::contention(
                    assignment.operation_id.clone(),
                    format!(
                        "Operation '{}' pushed back {pushed} ms by held resources",
                        assignment.operation_id
                    ),
                ));
                assignment.window = window;
                for member in &mut assignment.staff {
                    member.window = member.window.shifted(pushed);
                    let fits = self
                        .resources
                        .staff_member(&member.staff_id)
                        .is_some_and(|s| s.calendar.can_work(&member.window));
                    if !fits {
                        warn!(
                            staff = %member.staff_id,
                            operation = %assignment.operation_id,
                            "pushed crew leaves its shift"
                        );
                        violations.push(Violation::shift_overrun(
                            member.staff_id.clone(),
                            format!(
                                "Staff '{}' pushed outside their shift by '{}'",
                                member.staff_id, assignment.operation_id
                            ),
                        ));
                    }
                }
            }

            assignment.departure_ms = assignment.window.end_ms;
            assignment.delay_ms = assignment
                .departure_ms
                .saturating_sub(assignment.planned_departure_ms)
                .max(0);

            berths
                .entry(assignment.dock_code.clone())
                .or_default()
                .push(assignment.window);
            for crane in &assignment.crane_ids {
                cranes.entry(crane.clone()).or_default().push(assignment.window);
            }
            for member in &assignment.staff {
                staff
                    .entry(member.staff_id.clone())
                    .or_default()
                    .push(member.window);
            }
        }

        for violation in violations {
            schedule.add_violation(violation);
        }
        schedule.normalize();
        schedule
    }
}
