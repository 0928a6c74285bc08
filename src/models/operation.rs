//! Vessel operation model.
//!
//! An operation is one vessel's loading/unloading work item for the
//! scheduling day. It needs a dock berth, a crane allotment and a crew.
//!
//! # Time Representation
//! All times are in milliseconds relative to the scheduling day (t=0).

use serde::{Deserialize, Serialize};

/// A pending vessel operation (immutable input of a scheduling run).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    /// Unique operation identifier.
    pub id: String,
    /// Vessel being worked.
    pub vessel_id: String,
    /// Docks the vessel may be worked at, in order of preference.
    pub candidate_docks: Vec<String>,
    /// Earliest start (vessel arrival), ms.
    pub earliest_start_ms: i64,
    /// Baseline loading work with a single crane (ms).
    pub loading_ms: i64,
    /// Baseline unloading work with a single crane (ms).
    pub unloading_ms: i64,
    /// Required crane equipment type. `None` = any crane.
    #[serde(default)]
    pub equipment_type: Option<String>,
    /// Qualification codes every crew member must hold.
    #[serde(default)]
    pub required_qualifications: Vec<String>,
    /// Number of staff members needed simultaneously.
    #[serde(default = "default_crew_size")]
    pub crew_size: u32,
    /// Upper bound on cranes the vessel can be worked with.
    #[serde(default)]
    pub max_cranes: Option<u32>,
    /// Originally scheduled departure. `None` = single-crane baseline finish.
    #[serde(default)]
    pub planned_departure_ms: Option<i64>,
}

fn default_crew_size() -> u32 {
    1
}

impl OperationRequest {
    /// Creates a new operation for a vessel at a single dock.
    pub fn new(
        id: impl Into<String>,
        vessel_id: impl Into<String>,
        dock: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            vessel_id: vessel_id.into(),
            candidate_docks: vec![dock.into()],
            earliest_start_ms: 0,
            loading_ms: 0,
            unloading_ms: 0,
            equipment_type: None,
            required_qualifications: Vec::new(),
            crew_size: 1,
            max_cranes: None,
            planned_departure_ms: None,
        }
    }

    /// Adds an alternative dock (lower preference than existing ones).
    pub fn with_candidate_dock(mut self, dock: impl Into<String>) -> Self {
        self.candidate_docks.push(dock.into());
        self
    }

    /// Sets the earliest start (ms).
    pub fn with_earliest_start(mut self, start_ms: i64) -> Self {
        self.earliest_start_ms = start_ms;
        self
    }

    /// Sets baseline loading and unloading work (ms).
    pub fn with_work(mut self, loading_ms: i64, unloading_ms: i64) -> Self {
        self.loading_ms = loading_ms;
        self.unloading_ms = unloading_ms;
        self
    }

    /// Sets the required equipment type.
    pub fn with_equipment(mut self, equipment_type: impl Into<String>) -> Self {
        self.equipment_type = Some(equipment_type.into());
        self
    }

    /// Adds a required staff qualification.
    pub fn with_qualification(mut self, code: impl Into<String>) -> Self {
        self.required_qualifications.push(code.into());
        self
    }

    /// Sets the crew size.
    pub fn with_crew_size(mut self, crew_size: u32) -> Self {
        self.crew_size = crew_size;
        self
    }

    /// Caps the number of cranes.
    pub fn with_max_cranes(mut self, max_cranes: u32) -> Self {
        self.max_cranes = Some(max_cranes);
        self
    }

    /// Sets the originally scheduled departure (ms).
    pub fn with_planned_departure(mut self, departure_ms: i64) -> Self {
        self.planned_departure_ms = Some(departure_ms);
        self
    }

    /// Single-crane baseline work (loading + unloading), ms.
    pub fn baseline_ms(&self) -> i64 {
        self.loading_ms.saturating_add(self.unloading_ms)
    }

    /// Originally scheduled departure (ms).
    pub fn planned_departure(&self) -> i64 {
        self.planned_departure_ms
            .unwrap_or(self.earliest_start_ms.saturating_add(self.baseline_ms()))
    }

    /// Whether the operation may use a crane of the given type.
    pub fn accepts_equipment(&self, equipment_type: &str) -> bool {
        match &self.equipment_type {
            None => true,
            Some(required) => required == equipment_type,
        }
    }
}
