//! Crate error types.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that reject a scheduling request before or outside the search.
///
/// Infeasible operations are not errors: they are reported per operation
/// inside the returned schedule.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("invalid scheduling date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("unknown strategy '{0}' (expected optimal, greedy or local-search)")]
    UnknownStrategy(String),

    #[error(
        "crane count {requested} out of range [1, {available}] for operation '{operation}' at dock '{dock}'"
    )]
    CraneCountOutOfRange {
        operation: String,
        dock: String,
        requested: u32,
        available: u32,
    },

    #[error("input validation failed: {}", summarize(.0))]
    Validation(Vec<ValidationError>),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("resource catalog failure: {0}")]
    Catalog(String),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, ScheduleError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_validation_message_lists_errors() {
        let err = ScheduleError::Validation(vec![
            ValidationError::new(ValidationErrorKind::DuplicateId, "Duplicate dock code: D1"),
            ValidationError::new(ValidationErrorKind::EmptyCandidates, "Operation 'OP1' has no candidate dock"),
        ]);
        let text = err.to_string();
        assert!(text.contains("D1"));
        assert!(text.contains("OP1"));
    }

    #[test]
    fn test_crane_range_message() {
        let err = ScheduleError::CraneCountOutOfRange {
            operation: "OP1".into(),
            dock: "D1".into(),
            requested: 3,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "crane count 3 out of range [1, 2] for operation 'OP1' at dock 'D1'"
        );
    }
}
