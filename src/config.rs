//! Scheduler configuration.
//!
//! Every field has a default, so a partial JSON document (or `{}`) is a
//! valid configuration.
//!
//! ```
//! use port_schedule::config::SchedulerConfig;
//!
//! let config = SchedulerConfig::from_json_str(r#"{"optimal": {"node_limit": 5000}}"#).unwrap();
//! assert_eq!(config.optimal.node_limit, 5000);
//! assert_eq!(config.horizon_ms, 86_400_000);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};

/// One day in milliseconds.
pub const DAY_MS: i64 = 86_400_000;

/// Top-level scheduler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Exponent of the crane efficiency curve, in (0, 1).
    pub crane_efficiency_exponent: f64,
    /// Length of the scheduling day (ms). Work must end by this time.
    pub horizon_ms: i64,
    /// Branch-and-bound budgets.
    pub optimal: OptimalConfig,
    /// Local-search budgets.
    pub local_search: LocalSearchConfig,
}

/// Branch-and-bound budgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimalConfig {
    /// Maximum number of search nodes.
    pub node_limit: u64,
    /// Wall-clock budget (ms).
    pub time_limit_ms: u64,
    /// Nodes between clock checks.
    pub check_interval: u64,
}

/// Local-search budgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalSearchConfig {
    /// Maximum number of neighbor evaluations.
    pub max_iterations: u64,
    /// Perturbation restarts after a local optimum.
    pub max_restarts: u32,
    /// Random swaps applied per restart.
    pub perturbation_strength: usize,
    /// RNG seed (fixed for reproducible runs).
    pub seed: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            crane_efficiency_exponent: 0.75,
            horizon_ms: DAY_MS,
            optimal: OptimalConfig::default(),
            local_search: LocalSearchConfig::default(),
        }
    }
}

impl Default for OptimalConfig {
    fn default() -> Self {
        Self {
            node_limit: 250_000,
            time_limit_ms: 2_000,
            check_interval: 256,
        }
    }
}

impl Default for LocalSearchConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5_000,
            max_restarts: 5,
            perturbation_strength: 2,
            seed: 42,
        }
    }
}

impl SchedulerConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        let e = self.crane_efficiency_exponent;
        if !(e > 0.0 && e < 1.0) {
            return Err(ScheduleError::Config(format!(
                "crane_efficiency_exponent must be in (0, 1), got {e}"
            )));
        }
        if self.horizon_ms <= 0 {
            return Err(ScheduleError::Config(format!(
                "horizon_ms must be positive, got {}",
                self.horizon_ms
            )));
        }
        if self.optimal.check_interval == 0 {
            return Err(ScheduleError::Config(
                "optimal.check_interval must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = SchedulerConfig::default();
        assert!((c.crane_efficiency_exponent - 0.75).abs() < 1e-10);
        assert_eq!(c.horizon_ms, DAY_MS);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let c = SchedulerConfig::from_json_str(
            r#"{"local_search": {"seed": 7}, "crane_efficiency_exponent": 0.6}"#,
        )
        .unwrap();
        assert_eq!(c.local_search.seed, 7);
        assert_eq!(c.local_search.max_restarts, 5);
        assert!((c.crane_efficiency_exponent - 0.6).abs() < 1e-10);
    }

    #[test]
    fn test_rejects_bad_exponent() {
        let err = SchedulerConfig::from_json_str(r#"{"crane_efficiency_exponent": 1.0}"#)
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Config(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = SchedulerConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ScheduleError::Json(_)));
    }
}
