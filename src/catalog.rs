//! Resource catalog: where a scheduling day's input comes from.
//!
//! The scheduler reads the catalog once per request and never writes to it.
//! Vessel, dock and staff master data live elsewhere; implementors adapt
//! whatever store holds them.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::models::{OperationRequest, ResourceSnapshot};

/// Pending operations and available resources for one day.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaySnapshot {
    /// Operations waiting to be executed.
    #[serde(default)]
    pub operations: Vec<OperationRequest>,
    /// Docks, cranes and staff.
    #[serde(default)]
    pub resources: ResourceSnapshot,
}

impl DaySnapshot {
    /// Creates a snapshot.
    pub fn new(operations: Vec<OperationRequest>, resources: ResourceSnapshot) -> Self {
        Self {
            operations,
            resources,
        }
    }

    /// Parses a snapshot from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON snapshot file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| ScheduleError::Catalog(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }
}

/// Supplies the input of a scheduling day.
pub trait ResourceCatalog: Send + Sync {
    /// Operations and resources for `date`.
    fn day_snapshot(&self, date: NaiveDate) -> Result<DaySnapshot>;
}

/// Catalog held in memory, keyed by date.
///
/// Dates without an entry yield an empty day.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    days: BTreeMap<NaiveDate, DaySnapshot>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the snapshot for `date`.
    pub fn with_day(mut self, date: NaiveDate, snapshot: DaySnapshot) -> Self {
        self.days.insert(date, snapshot);
        self
    }

    /// Replaces the snapshot for `date`.
    pub fn insert(&mut self, date: NaiveDate, snapshot: DaySnapshot) {
        self.days.insert(date, snapshot);
    }
}

impl ResourceCatalog for InMemoryCatalog {
    fn day_snapshot(&self, date: NaiveDate) -> Result<DaySnapshot> {
        Ok(self.days.get(&date).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Dock;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_in_memory_lookup() {
        let snapshot = DaySnapshot::new(
            vec![OperationRequest::new("OP1", "V1", "D1").with_work(1000, 0)],
            ResourceSnapshot::new().with_dock(Dock::new("D1")),
        );
        let catalog = InMemoryCatalog::new().with_day(date("2024-05-01"), snapshot);

        let day = catalog.day_snapshot(date("2024-05-01")).unwrap();
        assert_eq!(day.operations.len(), 1);

        let other = catalog.day_snapshot(date("2024-05-02")).unwrap();
        assert!(other.operations.is_empty());
        assert!(other.resources.docks.is_empty());
    }

    #[test]
    fn test_snapshot_json_defaults() {
        let json = r#"{
            "operations": [
                {"id": "OP1", "vessel_id": "V1", "candidate_docks": ["D1"],
                 "earliest_start_ms": 0, "loading_ms": 3600000, "unloading_ms": 0}
            ],
            "resources": {
                "docks": [{"code": "D1", "cranes": [{"id": "C1", "equipment_type": "STS"}]}]
            }
        }"#;
        let day = DaySnapshot::from_json_str(json).unwrap();
        assert_eq!(day.operations[0].crew_size, 1);
        assert_eq!(day.resources.docks[0].berths, 1);
        assert!(day.resources.staff.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let err = DaySnapshot::from_json_file("/nonexistent/day.json").unwrap_err();
        assert!(matches!(err, ScheduleError::Catalog(_)));
    }
}
