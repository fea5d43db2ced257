//! CLI error handling.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use dpdp_common_config::{ConfigError, EnvError};
use dpdp_common_log::LogError;
use dpdp_compliance::config::MAX_PERIOD_DAYS;
use dpdp_compliance::{ComplianceError, StorageError};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Process exit codes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Success = 0,
    GeneralError = 1,
    ConfigError = 2,
    NotFound = 3,
    Conflict = 4,
    StorageError = 5,
    InvalidInput = 6,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

/// CLI error type with context for the user.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxError>,
        hint: Option<String>,
    },

    #[error("{message}")]
    NotFound {
        message: String,
        resource_type: &'static str,
        resource_name: String,
    },

    #[error("{message}")]
    Conflict { message: String },

    #[error("{message}")]
    Storage {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: io::Error,
        path: Option<PathBuf>,
    },
}

impl CliError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.to_string()),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        Self::Io {
            message: format!("failed to write {}: {source}", path.display()),
            source,
            path: Some(path),
        }
    }

    /// Stable error code for scripts.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "E001",
            Self::NotFound { .. } => "E002",
            Self::Conflict { .. } => "E003",
            Self::Storage { .. } => "E004",
            Self::Validation { .. } => "E005",
            Self::Io { .. } => "E006",
        }
    }

    /// Exit status for this error.
    pub fn exit(&self) -> Exit {
        match self {
            Self::Config { .. } => Exit::ConfigError,
            Self::NotFound { .. } => Exit::NotFound,
            Self::Conflict { .. } => Exit::Conflict,
            Self::Storage { .. } => Exit::StorageError,
            Self::Validation { .. } => Exit::InvalidInput,
            Self::Io { .. } => Exit::GeneralError,
        }
    }

    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Config { hint, .. } => hint.clone(),
            Self::NotFound {
                resource_type: "compliance record",
                resource_name,
                ..
            } => Some(format!("create it first with `dpdp create {resource_name}`")),
            Self::NotFound { resource_name, .. } => Some(format!(
                "list requests with `dpdp show {resource_name}`"
            )),
            Self::Validation {
                field: Some(field), ..
            } => Some(format!("check the value passed for {field}")),
            _ => None,
        }
    }
}

impl From<ComplianceError> for CliError {
    fn from(err: ComplianceError) -> Self {
        let message = err.to_string();
        match err {
            ComplianceError::NotFound { client_id } => Self::NotFound {
                message,
                resource_type: "compliance record",
                resource_name: client_id,
            },
            ComplianceError::RequestNotFound { client_id, .. } => Self::NotFound {
                message,
                resource_type: "rights request",
                resource_name: client_id,
            },
            ComplianceError::AlreadyExists { .. } | ComplianceError::InvalidTransition { .. } => {
                Self::Conflict { message }
            }
            ComplianceError::PeriodOutOfRange { setting, .. } => Self::Config {
                message,
                source: None,
                hint: Some(format!("set engine.{setting} to at most {MAX_PERIOD_DAYS}")),
            },
            ComplianceError::Storage(source) => Self::Storage {
                message,
                source: Some(Box::new(source)),
            },
        }
    }
}

impl From<StorageError> for CliError {
    fn from(err: StorageError) -> Self {
        Self::Storage {
            message: format!("storage error: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::NotFound { .. } => {
                Some("pass an existing file with --config or unset DPDP_CONFIG".to_string())
            }
            ConfigError::EnvVarNotFound { var } => Some(format!("export {var} or give a ${{{var}:-default}}")),
            _ => None,
        };
        Self::Config {
            message: format!("configuration error: {err}"),
            source: Some(Box::new(err)),
            hint,
        }
    }
}

impl From<EnvError> for CliError {
    fn from(err: EnvError) -> Self {
        Self::Config {
            message: format!("environment error: {err}"),
            source: Some(Box::new(err)),
            hint: None,
        }
    }
}

impl From<LogError> for CliError {
    fn from(err: LogError) -> Self {
        Self::Config {
            message: err.to_string(),
            source: Some(Box::new(err)),
            hint: Some("check logging.level or DPDP_LOG_LEVEL".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpdp_compliance::{RequestId, RequestStatus};

    #[test]
    fn test_compliance_errors_map_to_exit_codes() {
        let not_found: CliError = ComplianceError::NotFound {
            client_id: "c-1".into(),
        }
        .into();
        assert_eq!(not_found.exit(), Exit::NotFound);
        assert_eq!(not_found.hint().as_deref(), Some("create it first with `dpdp create c-1`"));

        let conflict: CliError = ComplianceError::InvalidTransition {
            request_id: RequestId::new(),
            status: RequestStatus::Fulfilled,
        }
        .into();
        assert_eq!(conflict.exit(), Exit::Conflict);
        assert!(conflict.to_string().contains("already fulfilled"));
    }

    #[test]
    fn test_out_of_range_period_is_a_config_error() {
        let err: CliError = ComplianceError::PeriodOutOfRange {
            setting: "consent.renewal_period_days",
            days: i64::MAX,
        }
        .into();
        assert_eq!(err.exit(), Exit::ConfigError);
        assert_eq!(
            err.hint().as_deref(),
            Some("set engine.consent.renewal_period_days to at most 36500")
        );
    }

    #[test]
    fn test_config_error_keeps_hint() {
        let err: CliError = ConfigError::NotFound {
            path: PathBuf::from("missing.yaml"),
        }
        .into();
        assert_eq!(err.exit(), Exit::ConfigError);
        assert_eq!(err.code(), "E001");
        assert!(err.hint().is_some());
    }

    #[test]
    fn test_validation_is_invalid_input() {
        let err = CliError::validation("--details", "must be a JSON object");
        assert_eq!(err.exit(), Exit::InvalidInput);
        assert_eq!(err.hint().as_deref(), Some("check the value passed for --details"));
    }

    #[test]
    fn test_exit_code_values() {
        assert_eq!(Exit::Success as u8, 0);
        assert_eq!(Exit::StorageError as u8, 5);
        assert_eq!(Exit::InvalidInput as u8, 6);
    }
}
