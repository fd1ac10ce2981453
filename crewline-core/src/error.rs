//! Staffing error types.
//!
//! Every failure mode has a named variant. No stringly-typed errors.
//! Resolution failures (a branch name that cannot be pinned down) are kept
//! separate from data-availability failures (nothing to compute from), so
//! callers can map them to different response classes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StaffingError {
    #[error("branch '{0}' not found in attendance data")]
    BranchNotFound(String),

    #[error("branch '{requested}' is ambiguous: matches {matches:?}")]
    AmbiguousBranch {
        requested: String,
        matches: Vec<String>,
    },

    #[error("branch '{0}' has no valid attendance rows after timestamp cleaning")]
    NoValidAttendance(String),

    #[error("attendance data is unavailable")]
    NoAttendanceData,

    #[error("monthly sales data is unavailable, so demand cannot be estimated")]
    NoDemandData,

    #[error("productivity could not be derived from attendance and monthly sales")]
    NoProductivityData,

    #[error("no attendance rows matched the requested filters")]
    NoMatchingRows,

    #[error("branch '{branch}' has {available} month(s) of sales history, {required} required")]
    InsufficientHistory {
        branch: String,
        available: usize,
        required: usize,
    },

    #[error("invalid {field}: {reason}")]
    InvalidRequest {
        field: &'static str,
        reason: String,
    },

    #[error("staffing benchmark failed: {0}")]
    Benchmark(String),
}

impl StaffingError {
    /// True for failures caused by an unresolvable branch name, as opposed
    /// to missing data or a bad parameter.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            StaffingError::BranchNotFound(_) | StaffingError::AmbiguousBranch { .. }
        )
    }
}

/// Result type alias for staffing computations.
pub type StaffingResult<T> = Result<T, StaffingError>;
