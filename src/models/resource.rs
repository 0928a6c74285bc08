//! Resource snapshot model.
//!
//! Docks (berths with their cranes) and staff members available on the
//! scheduling day. A snapshot is read once at the start of a run and never
//! mutated; strategies that run side by side each receive their own clone.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::ShiftCalendar;

/// A crane unit installed at a dock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crane {
    /// Unique crane identifier.
    pub id: String,
    /// Equipment type (e.g., "STS", "mobile", "gantry").
    pub equipment_type: String,
}

/// A berth with a fixed crane complement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dock {
    /// Unique dock code.
    pub code: String,
    /// Number of vessels that can be worked simultaneously.
    #[serde(default = "default_berths")]
    pub berths: u32,
    /// Cranes installed at this dock.
    #[serde(default)]
    pub cranes: Vec<Crane>,
}

fn default_berths() -> u32 {
    1
}

/// A staff member who can be rostered onto operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffMember {
    /// Unique staff identifier.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Qualification codes held.
    #[serde(default)]
    pub qualifications: BTreeSet<String>,
    /// Shift windows and blocked periods.
    #[serde(default)]
    pub calendar: ShiftCalendar,
}

/// Read-only view of the resources available for one scheduling day.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    /// Docks with their cranes.
    #[serde(default)]
    pub docks: Vec<Dock>,
    /// Staff pool.
    #[serde(default)]
    pub staff: Vec<StaffMember>,
    /// Qualification codes known besides those held by staff.
    #[serde(default)]
    pub qualifications: BTreeSet<String>,
}

impl Crane {
    /// Creates a crane.
    pub fn new(id: impl Into<String>, equipment_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            equipment_type: equipment_type.into(),
        }
    }
}

impl Dock {
    /// Creates a dock with one berth and no cranes.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            berths: 1,
            cranes: Vec::new(),
        }
    }

    /// Sets the berth capacity.
    pub fn with_berths(mut self, berths: u32) -> Self {
        self.berths = berths;
        self
    }

    /// Installs a crane.
    pub fn with_crane(mut self, id: impl Into<String>, equipment_type: impl Into<String>) -> Self {
        self.cranes.push(Crane::new(id, equipment_type));
        self
    }

    /// Total crane count.
    pub fn crane_count(&self) -> u32 {
        self.cranes.len() as u32
    }

    /// Cranes usable for an equipment requirement, sorted by id.
    pub fn compatible_cranes(&self, equipment_type: Option<&str>) -> Vec<&Crane> {
        let mut cranes: Vec<&Crane> = self
            .cranes
            .iter()
            .filter(|c| equipment_type.map_or(true, |t| c.equipment_type == t))
            .collect();
        cranes.sort_by(|a, b| a.id.cmp(&b.id));
        cranes
    }
}

impl StaffMember {
    /// Creates a staff member with no qualifications and no shifts.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            qualifications: BTreeSet::new(),
            calendar: ShiftCalendar::new(),
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a qualification.
    pub fn with_qualification(mut self, code: impl Into<String>) -> Self {
        self.qualifications.insert(code.into());
        self
    }

    /// Adds a shift.
    pub fn with_shift(mut self, start_ms: i64, end_ms: i64) -> Self {
        self.calendar = self.calendar.with_shift(start_ms, end_ms);
        self
    }

    /// Adds a blocked period.
    pub fn with_blocked(mut self, start_ms: i64, end_ms: i64) -> Self {
        self.calendar = self.calendar.with_blocked(start_ms, end_ms);
        self
    }

    /// Whether this staff member holds every listed qualification.
    pub fn is_qualified_for(&self, required: &[String]) -> bool {
        required.iter().all(|q| self.qualifications.contains(q))
    }
}

impl ResourceSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a dock.
    pub fn with_dock(mut self, dock: Dock) -> Self {
        self.docks.push(dock);
        self
    }

    /// Adds a staff member.
    pub fn with_staff(mut self, member: StaffMember) -> Self {
        self.staff.push(member);
        self
    }

    /// Registers a known qualification code held by nobody yet.
    pub fn with_qualification(mut self, code: impl Into<String>) -> Self {
        self.qualifications.insert(code.into());
        self
    }

    /// Looks up a dock by code.
    pub fn dock(&self, code: &str) -> Option<&Dock> {
        self.docks.iter().find(|d| d.code == code)
    }

    /// Looks up a staff member by id.
    pub fn staff_member(&self, id: &str) -> Option<&StaffMember> {
        self.staff.iter().find(|s| s.id == id)
    }

    /// Whether a qualification code is known: listed in the catalog or
    /// held by some staff member.
    pub fn knows_qualification(&self, code: &str) -> bool {
        self.qualifications.contains(code)
            || self.staff.iter().any(|s| s.qualifications.contains(code))
    }
}
