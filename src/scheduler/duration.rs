//! Crane-count duration model.
//!
//! # Model
//!
//! ```text
//! duration(op, k) = ceil(baseline / k^e),   baseline = loading + unloading
//! ```
//!
//! with `0 < e < 1`: every extra crane helps, but less than the previous one
//! (two cranes never halve the work). `k` ranges over `[1, max_cranes]`,
//! where `max_cranes` is the number of cranes at the dock compatible with
//! the operation's equipment type, capped by the operation's own limit.

use crate::error::{Result, ScheduleError};
use crate::models::{Dock, OperationRequest};

/// Default efficiency exponent.
pub const DEFAULT_EXPONENT: f64 = 0.75;

/// Pure crane-count → duration function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationModel {
    exponent: f64,
}

impl DurationModel {
    /// Creates a model with the given efficiency exponent.
    pub fn new(exponent: f64) -> Self {
        Self { exponent }
    }

    /// Efficiency exponent.
    pub fn exponent(&self) -> f64 {
        self.exponent
    }

    /// Speed-up factor for `cranes` concurrent cranes.
    #[inline]
    pub fn efficiency(&self, cranes: u32) -> f64 {
        (cranes as f64).powf(self.exponent)
    }

    /// Largest usable crane count for `operation` at `dock` (0 if none fit).
    pub fn max_cranes(&self, operation: &OperationRequest, dock: &Dock) -> u32 {
        let compatible = dock
            .compatible_cranes(operation.equipment_type.as_deref())
            .len() as u32;
        match operation.max_cranes {
            Some(limit) => compatible.min(limit),
            None => compatible,
        }
    }

    /// Processing time (ms) of `operation` at `dock` worked by `cranes` cranes.
    ///
    /// # Errors
    /// [`ScheduleError::CraneCountOutOfRange`] when `cranes` is outside
    /// `[1, max_cranes]`.
    pub fn duration_ms(
        &self,
        operation: &OperationRequest,
        dock: &Dock,
        cranes: u32,
    ) -> Result<i64> {
        let available = self.max_cranes(operation, dock);
        if cranes == 0 || cranes > available {
            return Err(ScheduleError::CraneCountOutOfRange {
                operation: operation.id.clone(),
                dock: dock.code.clone(),
                requested: cranes,
                available,
            });
        }
        Ok(self.scaled(operation.baseline_ms(), cranes))
    }

    fn scaled(&self, baseline_ms: i64, cranes: u32) -> i64 {
        if cranes == 1 {
            return baseline_ms;
        }
        (baseline_ms as f64 / self.efficiency(cranes)).ceil() as i64
    }
}

impl Default for DurationModel {
    fn default() -> Self {
        Self::new(DEFAULT_EXPONENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dock() -> Dock {
        Dock::new("D1")
            .with_crane("C1", "STS")
            .with_crane("C2", "STS")
            .with_crane("M1", "mobile")
    }

    fn op() -> OperationRequest {
        OperationRequest::new("OP1", "V1", "D1")
            .with_work(6_000_000, 4_000_000)
            .with_equipment("STS")
    }

    #[test]
    fn test_single_crane_is_baseline() {
        let model = DurationModel::default();
        assert_eq!(model.duration_ms(&op(), &dock(), 1).unwrap(), 10_000_000);
    }

    #[test]
    fn test_diminishing_returns() {
        let model = DurationModel::default();
        let one = model.duration_ms(&op(), &dock(), 1).unwrap();
        let two = model.duration_ms(&op(), &dock(), 2).unwrap();
        assert!(two < one);
        assert!(two * 2 > one);
        // 10_000_000 / 2^0.75 = 5_946_035.57…
        assert_eq!(two, 5_946_036);
    }

    #[test]
    fn test_max_cranes_respects_equipment_and_limit() {
        let model = DurationModel::default();
        assert_eq!(model.max_cranes(&op(), &dock()), 2);
        assert_eq!(model.max_cranes(&op().with_max_cranes(1), &dock()), 1);

        let any = OperationRequest::new("OP2", "V2", "D1").with_work(1_000, 0);
        assert_eq!(model.max_cranes(&any, &dock()), 3);
    }

    #[test]
    fn test_out_of_range() {
        let model = DurationModel::default();
        for k in [0, 3] {
            let err = model.duration_ms(&op(), &dock(), k).unwrap_err();
            assert!(matches!(
                err,
                ScheduleError::CraneCountOutOfRange { requested, available: 2, .. } if requested == k
            ));
        }
    }

    #[test]
    fn test_efficiency() {
        let model = DurationModel::new(0.5);
        assert!((model.efficiency(4) - 2.0).abs() < 1e-10);
        assert!((model.efficiency(1) - 1.0).abs() < 1e-10);
    }
}
