//! Bridge error types.
//!
//! Every failure mode has a named variant. No stringly-typed errors.

use thiserror::Error;

use crewline_core::StaffingError;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("malformed tool request: {0}")]
    MalformedRequest(String),

    #[error("invalid parameter for {op}: {reason}")]
    InvalidParameter { op: &'static str, reason: String },

    #[error("feed unavailable: {0}")]
    FeedError(String),

    #[error(transparent)]
    Staffing(#[from] StaffingError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse response class, the HTTP-status-equivalent distinction between a
/// name that did not resolve and a request the data cannot answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseClass {
    NotFound,
    BadRequest,
}

impl BridgeError {
    pub fn response_class(&self) -> ResponseClass {
        match self {
            BridgeError::Staffing(err) if err.is_resolution_error() => ResponseClass::NotFound,
            _ => ResponseClass::BadRequest,
        }
    }
}

/// Result type alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
