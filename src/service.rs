//! Request handling: parse, validate, look up the day, compare strategies.
//!
//! ```
//! use chrono::NaiveDate;
//! use port_schedule::catalog::{DaySnapshot, InMemoryCatalog};
//! use port_schedule::models::{Dock, OperationRequest, ResourceSnapshot, StaffMember};
//! use port_schedule::service::{Scheduler, SchedulingRequest};
//!
//! let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
//! let day = DaySnapshot::new(
//!     vec![OperationRequest::new("OP1", "V1", "D1").with_work(3_600_000, 0)],
//!     ResourceSnapshot::new()
//!         .with_dock(Dock::new("D1").with_crane("C1", "STS"))
//!         .with_staff(StaffMember::new("S1").with_shift(0, 86_400_000)),
//! );
//! let catalog = InMemoryCatalog::new().with_day(date, day);
//!
//! let request = SchedulingRequest::parse("2024-05-01", &["greedy"]).unwrap();
//! let response = Scheduler::default().run(&catalog, &request).unwrap();
//! assert_eq!(response.reports["greedy"].metric.total_delay_ms, 0);
//! ```

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::ResourceCatalog;
use crate::config::SchedulerConfig;
use crate::error::{Result, ScheduleError};
use crate::scheduler::{Comparator, StrategyKind, StrategyReport};
use crate::validation::validate_input_within;

/// Date format accepted by [`SchedulingRequest::parse`].
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A parsed scheduling request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingRequest {
    /// Scheduling day.
    pub date: NaiveDate,
    /// Strategies to run, without duplicates.
    pub strategies: Vec<StrategyKind>,
}

impl SchedulingRequest {
    /// Request for `date` running `strategies` (all three when empty).
    pub fn new(date: NaiveDate, strategies: Vec<StrategyKind>) -> Self {
        let mut unique = Vec::with_capacity(strategies.len());
        for kind in strategies {
            if !unique.contains(&kind) {
                unique.push(kind);
            }
        }
        if unique.is_empty() {
            unique = StrategyKind::ALL.to_vec();
        }
        Self {
            date,
            strategies: unique,
        }
    }

    /// Parses a `YYYY-MM-DD` date and strategy selectors.
    ///
    /// # Errors
    /// [`ScheduleError::InvalidDate`] or [`ScheduleError::UnknownStrategy`].
    pub fn parse(date: &str, selectors: &[&str]) -> Result<Self> {
        let parsed = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
            .map_err(|_| ScheduleError::InvalidDate(date.to_string()))?;
        let strategies = selectors
            .iter()
            .map(|s| s.parse::<StrategyKind>())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(parsed, strategies))
    }
}

/// Reports for one scheduling day.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulingResponse {
    /// Scheduling day.
    pub date: NaiveDate,
    /// Strategy name → report.
    pub reports: BTreeMap<String, StrategyReport>,
    /// Strategy name → panic message, for strategies that crashed.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub failures: BTreeMap<String, String>,
}

/// Entry point for scheduling requests.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    /// Creates a scheduler.
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// Scheduler configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Runs the requested strategies on the catalog's day.
    ///
    /// # Errors
    /// - [`ScheduleError::Config`] for an out-of-range configuration.
    /// - [`ScheduleError::Catalog`] when the catalog lookup fails.
    /// - [`ScheduleError::Validation`] when the day's input is malformed.
    pub fn run(
        &self,
        catalog: &dyn ResourceCatalog,
        request: &SchedulingRequest,
    ) -> Result<SchedulingResponse> {
        self.config.validate()?;

        let day = catalog.day_snapshot(request.date)?;
        if let Err(errors) =
            validate_input_within(&day.operations, &day.resources, self.config.horizon_ms)
        {
            warn!(date = %request.date, errors = errors.len(), "input rejected");
            return Err(ScheduleError::Validation(errors));
        }

        info!(
            date = %request.date,
            operations = day.operations.len(),
            docks = day.resources.docks.len(),
            staff = day.resources.staff.len(),
            "scheduling day"
        );

        let (reports, failures) = Comparator::from_kinds(&request.strategies, &self.config)
            .compare(&day.operations, &day.resources)
            .into_parts();
        if !failures.is_empty() {
            warn!(date = %request.date, failed = failures.len(), "strategies failed");
        }

        Ok(SchedulingResponse {
            date: request.date,
            reports,
            failures,
        })
    }
}
