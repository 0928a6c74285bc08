//! Daily scheduler for port operations.
//!
//! Given the pending vessel operations of a day and a snapshot of docks,
//! cranes and staff, decides for every operation which dock it works at,
//! when it starts, how many cranes it gets and which crew runs it. Three
//! strategies solve the same problem and are compared side by side on the
//! resulting departure delays.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `OperationRequest`, `Dock`, `Crane`,
//!   `StaffMember`, `ResourceSnapshot`, `Schedule`, `TimeWindow`
//! - **`scheduler`**: Duration model, staff matcher, delay propagator,
//!   greedy / local-search / branch-and-bound strategies, comparator
//! - **`dispatching`**: Priority rules that order operations for placement
//! - **`catalog`**: Source of a day's operations and resources
//! - **`service`**: Request parsing and the end-to-end `Scheduler`
//! - **`validation`**: Input integrity checks and schedule verification
//! - **`config`**, **`error`**, **`logging`**: Ambient plumbing
//!
//! # Example
//!
//! ```
//! use port_schedule::models::{Dock, OperationRequest, ResourceSnapshot, StaffMember};
//! use port_schedule::scheduler::{Comparator, StrategyKind};
//! use port_schedule::SchedulerConfig;
//!
//! let resources = ResourceSnapshot::new()
//!     .with_dock(Dock::new("D1").with_crane("C1", "STS").with_crane("C2", "STS"))
//!     .with_staff(StaffMember::new("S1").with_shift(0, 86_400_000));
//! let ops = vec![OperationRequest::new("OP1", "V1", "D1").with_work(7_200_000, 0)];
//!
//! let comparison = Comparator::from_kinds(&StrategyKind::ALL, &SchedulerConfig::default())
//!     .compare(&ops, &resources);
//! assert_eq!(comparison.len(), 3);
//! assert_eq!(comparison.report("optimal").unwrap().metric.total_delay_ms, 0);
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Bierwirth & Meisel (2015), "A follow-up survey of berth allocation and
//!   quay crane scheduling problems in container terminals"

pub mod catalog;
pub mod config;
pub mod dispatching;
pub mod error;
pub mod logging;
pub mod models;
pub mod scheduler;
pub mod service;
pub mod validation;

pub use catalog::{DaySnapshot, InMemoryCatalog, ResourceCatalog};
pub use config::SchedulerConfig;
pub use error::{Result, ScheduleError};
pub use service::{Scheduler, SchedulingRequest, SchedulingResponse};
