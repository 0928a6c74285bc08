//! Serial placement and partial-plan state.
//!
//! Every strategy describes a plan as a sequence of [`Decision`]s (which
//! operation next, at which dock, with how many cranes) and lets
//! [`PlanContext::decode`] turn it into concrete windows. Decoding is
//! deterministic, so equal decision vectors always yield equal schedules.
//!
//! # Placement
//!
//! For a chosen dock and crane count `k`, an operation starts at the
//! earliest `t >= earliest_start` with `t + duration <= horizon` such that
//! 1. the dock has a free berth over `[t, t + duration)`,
//! 2. `k` compatible cranes are idle (lowest IDs win),
//! 3. the staff matcher finds a full crew.
//!
//! Only `earliest_start` and release points (usage ends, shift starts,
//! blocked-period ends) need to be tried: feasibility can only switch on
//! at those instants.
//!
//! # Branch state
//!
//! [`PlanState`] keeps per-resource timelines behind `Arc`, so cloning a
//! state for a search branch is cheap and writes copy only the touched
//! timeline.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::duration::DurationModel;
use super::staff::{StaffLedger, StaffMatcher};
use crate::config::SchedulerConfig;
use crate::models::{
    peak_overlap, Crane, InfeasibilityReason, OperationRequest, ResourceSnapshot, Schedule,
    ScheduleAssignment, StaffAssignment, TimeWindow,
};

/// One feasible (dock, crane count) pair for an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementOption {
    /// Position of the dock in the operation's candidate list.
    pub dock_rank: usize,
    /// Dock code.
    pub dock_code: String,
    /// Crane count.
    pub cranes: u32,
    /// Processing time with `cranes` cranes (ms).
    pub duration_ms: i64,
}

/// Place operation `op` using its option `option`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decision {
    /// Index into the operation slice.
    pub op: usize,
    /// Index into [`PlanContext::options`] for `op`.
    pub option: usize,
}

impl Decision {
    /// Creates a decision.
    pub fn new(op: usize, option: usize) -> Self {
        Self { op, option }
    }
}

/// Lexicographic objective: unassigned count, then total delay, then max delay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Objective {
    /// Operations left unplaced.
    pub unassigned: usize,
    /// Sum of delays (ms).
    pub total_delay_ms: i64,
    /// Largest delay (ms).
    pub max_delay_ms: i64,
}

impl Objective {
    /// Objective of a finished schedule.
    pub fn of_schedule(schedule: &Schedule) -> Self {
        Self {
            unassigned: schedule.unassigned.len(),
            total_delay_ms: schedule.total_delay_ms(),
            max_delay_ms: schedule.max_delay_ms(),
        }
    }

    /// Strictly better without raising total delay.
    ///
    /// Searches only move to plans that pass this test, so total delay never
    /// grows along an improvement chain.
    pub fn improves_on(&self, other: &Self) -> bool {
        self < other && self.total_delay_ms <= other.total_delay_ms
    }
}

/// A concrete placement produced by [`PlanState::place`].
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Operation index.
    pub op: usize,
    /// Option index used.
    pub option: usize,
    /// Dock code.
    pub dock_code: String,
    /// Allotted cranes.
    pub crane_ids: Vec<String>,
    /// Work window.
    pub window: TimeWindow,
    /// Crew.
    pub staff: Vec<StaffAssignment>,
    /// Delay against planned departure (ms).
    pub delay_ms: i64,
}

/// Immutable per-run context shared by all branches.
#[derive(Debug)]
pub struct PlanContext<'a> {
    operations: &'a [OperationRequest],
    resources: &'a ResourceSnapshot,
    horizon_ms: i64,
    options: Vec<Vec<PlacementOption>>,
    blockers: Vec<Option<InfeasibilityReason>>,
}

impl<'a> PlanContext<'a> {
    /// Precomputes placement options and static infeasibility.
    pub fn new(
        operations: &'a [OperationRequest],
        resources: &'a ResourceSnapshot,
        config: &SchedulerConfig,
    ) -> Self {
        let durations = DurationModel::new(config.crane_efficiency_exponent);
        let matcher = StaffMatcher::new(resources);

        let mut options = Vec::with_capacity(operations.len());
        let mut blockers = Vec::with_capacity(operations.len());
        for op in operations {
            let op_options = enumerate_options(op, resources, &durations);
            let blocker = static_blocker(op, resources, &op_options, &matcher, config.horizon_ms);
            if let Some(reason) = blocker {
                debug!(operation = %op.id, %reason, "operation statically infeasible");
            }
            options.push(op_options);
            blockers.push(blocker);
        }

        Self {
            operations,
            resources,
            horizon_ms: config.horizon_ms,
            options,
            blockers,
        }
    }

    /// Operations being planned.
    pub fn operations(&self) -> &'a [OperationRequest] {
        self.operations
    }

    /// Resource snapshot.
    pub fn resources(&self) -> &'a ResourceSnapshot {
        self.resources
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether there is nothing to plan.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Placement options of `op`, dock preference first, cranes ascending.
    pub fn options(&self, op: usize) -> &[PlacementOption] {
        &self.options[op]
    }

    /// Reason `op` can never be placed, if any.
    pub fn blocker(&self, op: usize) -> Option<InfeasibilityReason> {
        self.blockers[op]
    }

    /// Shortest processing time over all options of `op`.
    pub fn fastest_ms(&self, op: usize) -> Option<i64> {
        self.options[op].iter().map(|o| o.duration_ms).min()
    }

    /// Delay `op` incurs even with no contention at all.
    pub fn delay_lower_bound(&self, op: usize) -> i64 {
        let operation = &self.operations[op];
        match self.fastest_ms(op) {
            Some(fastest) => {
                operation
                .earliest_start_ms
                .saturating_add(fastest)
                .saturating_sub(operation.planned_departure())
                .max(0)
            }
            None => 0,
        }
    }

    /// Replays `decisions` on an empty plan.
    pub fn decode(&self, decisions: &[Decision]) -> PlanState {
        let mut state = PlanState::new();
        for decision in decisions {
            state.apply(self, *decision);
        }
        state
    }
}

fn enumerate_options(
    op: &OperationRequest,
    resources: &ResourceSnapshot,
    durations: &DurationModel,
) -> Vec<PlacementOption> {
    let mut options = Vec::new();
    for (rank, code) in op.candidate_docks.iter().enumerate() {
        let Some(dock) = resources.dock(code) else {
            continue;
        };
        for cranes in 1..=durations.max_cranes(op, dock) {
            match durations.duration_ms(op, dock, cranes) {
                Ok(duration_ms) => options.push(PlacementOption {
                    dock_rank: rank,
                    dock_code: dock.code.clone(),
                    cranes,
                    duration_ms,
                }),
                Err(e) => debug!(error = %e, "skipping crane count"),
            }
        }
    }
    options
}

fn static_blocker(
    op: &OperationRequest,
    resources: &ResourceSnapshot,
    options: &[PlacementOption],
    matcher: &StaffMatcher<'_>,
    horizon_ms: i64,
) -> Option<InfeasibilityReason> {
    if !op.candidate_docks.iter().any(|c| resources.dock(c).is_some()) {
        return Some(InfeasibilityReason::UnknownDock);
    }
    let Some(fastest) = options.iter().map(|o| o.duration_ms).min() else {
        return Some(InfeasibilityReason::NoCompatibleEquipment);
    };
    let crew = op.crew_size as usize;

    let qualified = matcher.qualified(op);
    if qualified.len() < crew {
        return Some(InfeasibilityReason::NoQualifiedStaff);
    }
    let long_enough = qualified
        .iter()
        .filter(|s| s.calendar.longest_workable_ms() >= fastest)
        .count();
    if long_enough < crew {
        return Some(InfeasibilityReason::NoStaffOnShift);
    }
    if op.earliest_start_ms.saturating_add(fastest) > horizon_ms {
        return Some(InfeasibilityReason::CapacityExhausted);
    }
    None
}

/// Partial assignment built up one decision at a time.
#[derive(Debug, Clone, Default)]
pub struct PlanState {
    berths: BTreeMap<String, Arc<Vec<TimeWindow>>>,
    cranes: BTreeMap<String, Arc<Vec<TimeWindow>>>,
    staff: StaffLedger,
    placements: Vec<Placement>,
    rejected: Vec<(usize, InfeasibilityReason)>,
    objective: Objective,
}

impl PlanState {
    /// Creates an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Objective accumulated so far.
    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Committed placements, in commit order.
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Rejected operations with reasons.
    pub fn rejected(&self) -> &[(usize, InfeasibilityReason)] {
        &self.rejected
    }

    /// Finds the earliest feasible placement of `op` with option `option`.
    ///
    /// Does not modify the plan.
    pub fn place(
        &self,
        ctx: &PlanContext<'_>,
        op: usize,
        option: usize,
    ) -> Result<Placement, InfeasibilityReason> {
        if let Some(reason) = ctx.blocker(op) {
            return Err(reason);
        }
        let operation = &ctx.operations[op];
        let choice = ctx
            .options(op)
            .get(option)
            .ok_or(InfeasibilityReason::NoCompatibleEquipment)?;
        let dock = ctx
            .resources
            .dock(&choice.dock_code)
            .ok_or(InfeasibilityReason::UnknownDock)?;
        let compatible = dock.compatible_cranes(operation.equipment_type.as_deref());
        let matcher = StaffMatcher::new(ctx.resources);
        let qualified = matcher.qualified(operation);
        let needed = choice.cranes as usize;

        let mut starts = vec![operation.earliest_start_ms];
        starts.extend(timeline(&self.berths, &dock.code).iter().map(|w| w.end_ms));
        for crane in &compatible {
            starts.extend(timeline(&self.cranes, &crane.id).iter().map(|w| w.end_ms));
        }
        for member in &qualified {
            starts.extend(self.staff.windows(&member.id).iter().map(|w| w.end_ms));
            starts.extend(member.calendar.release_points());
        }
        starts.retain(|&t| {
            t >= operation.earliest_start_ms
                && t.saturating_add(choice.duration_ms) <= ctx.horizon_ms
        });
        starts.sort_unstable();
        starts.dedup();

        let mut only_off_shift = !starts.is_empty();
        for t in starts {
            let window = TimeWindow::starting_at(t, choice.duration_ms);

            if peak_overlap(timeline(&self.berths, &dock.code).iter(), &window)
                >= dock.berths as usize
            {
                only_off_shift = false;
                continue;
            }
            let idle: Vec<&Crane> = compatible
                .iter()
                .copied()
                .filter(|c| is_free(&self.cranes, &c.id, &window))
                .take(needed)
                .collect();
            if idle.len() < needed {
                only_off_shift = false;
                continue;
            }
            match matcher.match_crew(operation, &window, &self.staff) {
                Ok(staff) => {
                    return Ok(Placement {
                        op,
                        option,
                        dock_code: dock.code.clone(),
                        crane_ids: idle.iter().map(|c| c.id.clone()).collect(),
                        window,
                        staff,
                        delay_ms: window
                            .end_ms
                            .saturating_sub(operation.planned_departure())
                            .max(0),
                    })
                }
                Err(InfeasibilityReason::NoStaffOnShift) => {}
                Err(_) => only_off_shift = false,
            }
        }

        if only_off_shift {
            Err(InfeasibilityReason::NoStaffOnShift)
        } else {
            Err(InfeasibilityReason::CapacityExhausted)
        }
    }

    /// Commits a placement found by [`place`](Self::place).
    pub fn commit(&mut self, placement: Placement) {
        Arc::make_mut(self.berths.entry(placement.dock_code.clone()).or_default())
            .push(placement.window);
        for crane in &placement.crane_ids {
            Arc::make_mut(self.cranes.entry(crane.clone()).or_default()).push(placement.window);
        }
        for assignment in &placement.staff {
            self.staff.commit(assignment);
        }
        self.objective.total_delay_ms += placement.delay_ms;
        self.objective.max_delay_ms = self.objective.max_delay_ms.max(placement.delay_ms);
        self.placements.push(placement);
    }

    /// Marks `op` as unplaceable.
    pub fn reject(&mut self, op: usize, reason: InfeasibilityReason) {
        self.rejected.push((op, reason));
        self.objective.unassigned += 1;
    }

    /// Places `decision` or rejects its operation.
    pub fn apply(&mut self, ctx: &PlanContext<'_>, decision: Decision) {
        match self.place(ctx, decision.op, decision.option) {
            Ok(placement) => self.commit(placement),
            Err(reason) => self.reject(decision.op, reason),
        }
    }

    /// Converts the plan into a normalized schedule.
    pub fn into_schedule(self, ctx: &PlanContext<'_>, strategy: &str) -> Schedule {
        let mut schedule = Schedule::new(strategy);
        for p in self.placements {
            let op = &ctx.operations[p.op];
            schedule.add_assignment(ScheduleAssignment {
                operation_id: op.id.clone(),
                vessel_id: op.vessel_id.clone(),
                dock_code: p.dock_code,
                crane_ids: p.crane_ids,
                duration_ms: p.window.duration_ms(),
                window: p.window,
                staff: p.staff,
                planned_departure_ms: op.planned_departure(),
                departure_ms: p.window.end_ms,
                delay_ms: p.delay_ms,
            });
        }
        for (op, reason) in self.rejected {
            schedule.add_unassigned(ctx.operations[op].id.clone(), reason);
        }
        schedule.normalize();
        schedule
    }
}

fn timeline<'s>(map: &'s BTreeMap<String, Arc<Vec<TimeWindow>>>, key: &str) -> &'s [TimeWindow] {
    map.get(key).map_or(&[], |ws| ws.as_slice())
}

fn is_free(map: &BTreeMap<String, Arc<Vec<TimeWindow>>>, key: &str, window: &TimeWindow) -> bool {
    !timeline(map, key).iter().any(|w| w.overlaps(window))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dock, StaffMember};

    const H: i64 = 3_600_000;

    fn resources() -> ResourceSnapshot {
        ResourceSnapshot::new()
            .with_dock(Dock::new("D1").with_crane("C1", "STS").with_crane("C2", "STS"))
            .with_dock(Dock::new("D2").with_berths(2).with_crane("M1", "mobile"))
            .with_staff(StaffMember::new("S1").with_qualification("crane-op").with_shift(0, 12 * H))
            .with_staff(StaffMember::new("S2").with_qualification("crane-op").with_shift(0, 12 * H))
            .with_qualification("pilot")
    }

    fn op(id: &str) -> OperationRequest {
        OperationRequest::new(id, format!("V-{id}"), "D1")
            .with_work(2 * H, 2 * H)
            .with_qualification("crane-op")
    }

    #[test]
    fn test_options_enumerated_by_preference() {
        let ops = vec![op("A").with_candidate_dock("D2")];
        let res = resources();
        let ctx = PlanContext::new(&ops, &res, &SchedulerConfig::default());
        let opts = ctx.options(0);
        let pairs: Vec<(&str, u32)> = opts.iter().map(|o| (o.dock_code.as_str(), o.cranes)).collect();
        assert_eq!(pairs, vec![("D1", 1), ("D1", 2), ("D2", 1)]);
        assert_eq!(ctx.fastest_ms(0), Some(opts[1].duration_ms));
    }

    #[test]
    fn test_static_blockers() {
        let ops = vec![
            OperationRequest::new("X", "V", "NOPE").with_work(H, 0),
            op("Y").with_equipment("gantry"),
            op("Z").with_qualification("pilot"),
            op("W").with_work(20 * H, 0).with_max_cranes(1),
            op("OK"),
        ];
        let res = resources();
        let ctx = PlanContext::new(&ops, &res, &SchedulerConfig::default());
        assert_eq!(ctx.blocker(0), Some(InfeasibilityReason::UnknownDock));
        assert_eq!(ctx.blocker(1), Some(InfeasibilityReason::NoCompatibleEquipment));
        assert_eq!(ctx.blocker(2), Some(InfeasibilityReason::NoQualifiedStaff));
        assert_eq!(ctx.blocker(3), Some(InfeasibilityReason::NoStaffOnShift));
        assert_eq!(ctx.blocker(4), None);
    }

    #[test]
    fn test_serial_placement_waits_for_cranes() {
        let ops = vec![op("A"), op("B")];
        let res = resources();
        let ctx = PlanContext::new(&ops, &res, &SchedulerConfig::default());
        let state = ctx.decode(&[Decision::new(0, 0), Decision::new(1, 0)]);

        let placements = state.placements();
        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].window, TimeWindow::new(0, 4 * H));
        // one berth at D1: B waits for A even though C2 is idle
        assert_eq!(placements[1].window, TimeWindow::new(4 * H, 8 * H));
        assert_eq!(placements[0].crane_ids, vec!["C1".to_string()]);
        assert_eq!(placements[1].delay_ms, 4 * H);
        assert_eq!(
            state.objective(),
            Objective {
                unassigned: 0,
                total_delay_ms: 4 * H,
                max_delay_ms: 4 * H
            }
        );
    }

    #[test]
    fn test_two_berths_share_cranes() {
        let ops = vec![
            op("A").with_candidate_dock("D2"),
            op("B").with_candidate_dock("D2"),
        ];
        let res = resources();
        let ctx = PlanContext::new(&ops, &res, &SchedulerConfig::default());
        // option 2 = D2 with its single mobile crane
        let state = ctx.decode(&[Decision::new(0, 2), Decision::new(1, 2)]);
        let p = state.placements();
        assert_eq!(p[0].crane_ids, vec!["M1".to_string()]);
        // berth free, crane busy → B waits for M1
        assert_eq!(p[1].window.start_ms, 4 * H);
    }

    #[test]
    fn test_horizon_exhaustion() {
        let ops = vec![op("A").with_work(8 * H, 0), op("B").with_work(8 * H, 0)];
        let res = resources();
        let config = SchedulerConfig {
            horizon_ms: 12 * H,
            ..SchedulerConfig::default()
        };
        let ctx = PlanContext::new(&ops, &res, &config);
        let state = ctx.decode(&[Decision::new(0, 0), Decision::new(1, 0)]);
        assert_eq!(state.placements().len(), 1);
        assert_eq!(
            state.rejected(),
            &[(1, InfeasibilityReason::CapacityExhausted)]
        );
        assert_eq!(state.objective().unassigned, 1);
    }

    #[test]
    fn test_branch_clone_is_independent() {
        let ops = vec![op("A"), op("B")];
        let res = resources();
        let ctx = PlanContext::new(&ops, &res, &SchedulerConfig::default());
        let mut root = PlanState::new();
        root.apply(&ctx, Decision::new(0, 0));

        let mut branch = root.clone();
        branch.apply(&ctx, Decision::new(1, 1));
        assert_eq!(root.placements().len(), 1);
        assert_eq!(branch.placements().len(), 2);
    }

    #[test]
    fn test_into_schedule() {
        let ops = vec![op("B"), op("A")];
        let res = resources();
        let ctx = PlanContext::new(&ops, &res, &SchedulerConfig::default());
        let schedule = ctx
            .decode(&[Decision::new(0, 1), Decision::new(1, 1)])
            .into_schedule(&ctx, "greedy");
        assert_eq!(schedule.strategy, "greedy");
        assert_eq!(schedule.assignments[0].operation_id, "B");
        assert_eq!(schedule.assignments[0].crane_count(), 2);
        assert_eq!(schedule.assignments[0].staff.len(), 1);
        assert_eq!(schedule.assignments[1].start_ms(), schedule.assignments[0].end_ms());
    }

    #[test]
    fn test_improves_on() {
        let base = Objective {
            unassigned: 1,
            total_delay_ms: 100,
            max_delay_ms: 100,
        };
        let fewer_unassigned_more_delay = Objective {
            unassigned: 0,
            total_delay_ms: 200,
            max_delay_ms: 200,
        };
        let less_delay = Objective {
            unassigned: 1,
            total_delay_ms: 50,
            max_delay_ms: 50,
        };
        assert!(!fewer_unassigned_more_delay.improves_on(&base));
        assert!(less_delay.improves_on(&base));
        assert!(!base.improves_on(&base));
    }
}
