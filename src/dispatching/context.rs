//! Scheduling context for dispatching rule evaluation.

use std::collections::HashMap;

/// Runtime state passed to dispatching rules.
///
/// All times are in milliseconds relative to the scheduling day (t=0).
#[derive(Debug, Clone, Default)]
pub struct SchedulingContext {
    /// Current simulation time (ms).
    pub current_time_ms: i64,
    /// Work already committed per dock (dock code → ms).
    pub dock_backlog_ms: HashMap<String, i64>,
}

impl SchedulingContext {
    /// Creates a context at the given time.
    pub fn at_time(current_time_ms: i64) -> Self {
        Self {
            current_time_ms,
            ..Default::default()
        }
    }

    /// Sets the committed backlog at a dock.
    pub fn with_dock_backlog(mut self, dock: impl Into<String>, ms: i64) -> Self {
        self.dock_backlog_ms.insert(dock.into(), ms);
        self
    }
}
