//! Port scheduling domain models.
//!
//! Provides the core data types for one scheduling day: pending vessel
//! operations, the resource snapshot they draw from, and the schedules
//! strategies produce.
//!
//! # Domain Mappings
//!
//! | port-schedule | Scheduling theory | Port operations |
//! |---------------|-------------------|-----------------|
//! | OperationRequest | Job | Vessel call (load/unload) |
//! | Dock | Cumulative resource | Berth |
//! | Crane | Unary resource | Quay crane |
//! | StaffMember | Skilled renewable resource | Crane operator, lasher |
//! | Schedule | Solution | Daily berth plan |

mod calendar;
mod operation;
mod resource;
mod schedule;

pub use calendar::{ShiftCalendar, TimeWindow};
pub(crate) use calendar::peak_overlap;
pub use operation::OperationRequest;
pub use resource::{Crane, Dock, ResourceSnapshot, StaffMember};
pub use schedule::{
    InfeasibilityReason, Optimality, Schedule, ScheduleAssignment, StaffAssignment,
    UnassignedOperation, Violation, ViolationType,
};
