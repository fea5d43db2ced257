//! Compliance engine errors.

use crate::model::RequestStatus;
use dpdp_audit_log::StorageError;
use dpdp_audit_types::RequestId;
use thiserror::Error;

/// Result type for engine operations.
pub type ComplianceResult<T> = Result<T, ComplianceError>;

/// Structural failures of an engine operation.
///
/// Business outcomes such as a rejected erasure request are returned as
/// data, never as errors.
#[derive(Debug, Error)]
pub enum ComplianceError {
    // 404
    #[error("no compliance record for client '{client_id}'")]
    NotFound { client_id: String },

    #[error("no request {request_id} for client '{client_id}'")]
    RequestNotFound {
        client_id: String,
        request_id: RequestId,
    },

    // 409
    #[error("compliance record for client '{client_id}' already exists")]
    AlreadyExists { client_id: String },

    #[error("request {request_id} is already {status}")]
    InvalidTransition {
        request_id: RequestId,
        status: RequestStatus,
    },

    // 500
    #[error("configured {setting} of {days} days is out of range")]
    PeriodOutOfRange { setting: &'static str, days: i64 },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ComplianceError {
    pub(crate) fn not_found(client_id: &str) -> Self {
        Self::NotFound {
            client_id: client_id.to_string(),
        }
    }

    /// HTTP-style status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } | Self::RequestNotFound { .. } => 404,
            Self::AlreadyExists { .. } | Self::InvalidTransition { .. } => 409,
            Self::PeriodOutOfRange { .. } | Self::Storage(_) => 500,
        }
    }

    /// Get error code for client handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::RequestNotFound { .. } => "request_not_found",
            Self::AlreadyExists { .. } => "already_exists",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::PeriodOutOfRange { .. } => "period_out_of_range",
            Self::Storage(_) => "storage_error",
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
