//! Shift calendar and time window models.
//!
//! Staff availability is expressed as a set of shift windows plus
//! blocked periods (breaks, leave, training).
//!
//! # Time Model
//! All times are in milliseconds relative to the scheduling day (t=0 is
//! the start of the day).
//!
//! # Precedence
//! Blocked periods override shift windows. An interval is workable iff:
//! - It lies entirely inside exactly one `shifts` entry, AND
//! - It does NOT intersect any `blocked_periods` entry.

use serde::{Deserialize, Serialize};

/// A time interval [start, end).
///
/// Half-open interval: includes start, excludes end.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeWindow {
    /// Interval start (ms, inclusive).
    pub start_ms: i64,
    /// Interval end (ms, exclusive).
    pub end_ms: i64,
}

impl TimeWindow {
    /// Creates a new time window.
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    /// Window of `duration_ms` starting at `start_ms`.
    pub fn starting_at(start_ms: i64, duration_ms: i64) -> Self {
        Self::new(start_ms, start_ms.saturating_add(duration_ms))
    }

    /// Duration of this window (ms).
    #[inline]
    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    /// Whether a timestamp falls within this window.
    #[inline]
    pub fn contains(&self, time_ms: i64) -> bool {
        time_ms >= self.start_ms && time_ms < self.end_ms
    }

    /// Whether `other` lies entirely inside this window.
    #[inline]
    pub fn covers(&self, other: &Self) -> bool {
        self.start_ms <= other.start_ms && other.end_ms <= self.end_ms
    }

    /// Whether two windows overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_ms < other.end_ms && other.start_ms < self.end_ms
    }

    /// Same window moved by `delta_ms`.
    pub fn shifted(&self, delta_ms: i64) -> Self {
        Self::new(
            self.start_ms.saturating_add(delta_ms),
            self.end_ms.saturating_add(delta_ms),
        )
    }

    /// Whether the window is non-empty and well-ordered.
    pub fn is_valid(&self) -> bool {
        self.end_ms > self.start_ms
    }
}

/// Staff availability calendar.
///
/// Unlike a machine calendar, an empty `shifts` list means the staff
/// member is never available: crews are only rostered inside shifts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShiftCalendar {
    /// Rostered shifts.
    pub shifts: Vec<TimeWindow>,
    /// Periods when the staff member is unavailable (overrides shifts).
    #[serde(default)]
    pub blocked_periods: Vec<TimeWindow>,
}

impl ShiftCalendar {
    /// Creates an empty calendar (no shifts).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a shift.
    pub fn with_shift(mut self, start_ms: i64, end_ms: i64) -> Self {
        self.shifts.push(TimeWindow::new(start_ms, end_ms));
        self
    }

    /// Adds a blocked period.
    pub fn with_blocked(mut self, start_ms: i64, end_ms: i64) -> Self {
        self.blocked_periods.push(TimeWindow::new(start_ms, end_ms));
        self
    }

    /// Returns the single shift that fully contains `window`, if any.
    pub fn shift_covering(&self, window: &TimeWindow) -> Option<&TimeWindow> {
        self.shifts.iter().find(|s| s.covers(window))
    }

    /// Whether `window` can be worked: inside one shift, clear of blocked periods.
    pub fn can_work(&self, window: &TimeWindow) -> bool {
        self.shift_covering(window).is_some()
            && !self.blocked_periods.iter().any(|b| b.overlaps(window))
    }

    /// Longest uninterrupted workable stretch (ms).
    ///
    /// Used to rule out operations that can never fit in any shift.
    pub fn longest_workable_ms(&self) -> i64 {
        let mut best = 0;
        for shift in &self.shifts {
            let mut cursor = shift.start_ms;
            let mut blocks: Vec<&TimeWindow> = self
                .blocked_periods
                .iter()
                .filter(|b| b.overlaps(shift))
                .collect();
            blocks.sort_by_key(|b| b.start_ms);
            for b in blocks {
                best = best.max(b.start_ms.max(cursor) - cursor);
                cursor = cursor.max(b.end_ms);
            }
            best = best.max(shift.end_ms - cursor);
        }
        best.max(0)
    }

    /// Times at which new work may begin: shift starts and blocked-period ends.
    pub fn release_points(&self) -> impl Iterator<Item = i64> + '_ {
        self.shifts
            .iter()
            .map(|s| s.start_ms)
            .chain(self.blocked_periods.iter().map(|b| b.end_ms))
    }
}

/// Peak number of `busy` windows simultaneously active inside `window`.
pub(crate) fn peak_overlap<'a, I>(busy: I, window: &TimeWindow) -> usize
where
    I: IntoIterator<Item = &'a TimeWindow>,
{
    let mut events: Vec<(i64, i32)> = Vec::new();
    for w in busy {
        if w.overlaps(window) {
            events.push((w.start_ms.max(window.start_ms), 1));
            events.push((w.end_ms.min(window.end_ms), -1));
        }
    }
    // Ends sort before starts at the same instant (half-open intervals).
    events.sort();
    let mut current = 0i32;
    let mut peak = 0i32;
    for (_, delta) in events {
        current += delta;
        peak = peak.max(current);
    }
    peak as usize
}
