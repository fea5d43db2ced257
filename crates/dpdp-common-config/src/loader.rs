//! Configuration file loading and parsing.

use crate::env::{vars, Environment};
use crate::types::{DpdpConfig, LoggingConfig};
use dpdp_compliance::config::MAX_PERIOD_DAYS;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config directory inside a project.
pub const CONFIG_DIR: &str = ".dpdp";

/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.yaml";

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        message: message.into(),
    }
}

/// Configuration loader.
pub struct ConfigLoader {
    base_path: PathBuf,
    explicit_file: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader for the given project directory.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            base_path: project_dir.as_ref().to_path_buf(),
            explicit_file: None,
        }
    }

    /// Load from this file instead of the project default.
    ///
    /// Unlike the project default, an explicit file must exist.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }

    /// Path the loader reads.
    pub fn config_path(&self) -> PathBuf {
        self.explicit_file
            .clone()
            .unwrap_or_else(|| self.base_path.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load configuration, apply environment overrides and validate.
    pub fn load(&self) -> Result<DpdpConfig, ConfigError> {
        let config_path = self.config_path();

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let expanded = self.expand_env_vars(&contents)?;
            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?
        } else if self.explicit_file.is_some() {
            return Err(ConfigError::NotFound { path: config_path });
        } else {
            DpdpConfig::default()
        };

        self.apply_env_overrides(&mut config);
        self.validate(&config)?;
        Ok(config)
    }

    fn apply_env_overrides(&self, config: &mut DpdpConfig) {
        if let Some(path) = Environment::get(vars::DPDP_DATABASE_PATH) {
            config.storage.database_path = PathBuf::from(path);
        }
    }

    /// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
    fn expand_env_vars(&self, content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").map_err(|e| {
            ConfigError::ParseError {
                line: None,
                message: e.to_string(),
            }
        })?;

        for cap in re.captures_iter(content) {
            let Some(full_match) = cap.get(0).map(|m| m.as_str()) else {
                continue;
            };
            let var_name = &cap[1];
            let default = cap.get(2).map(|m| m.as_str());

            let value = match std::env::var(var_name) {
                Ok(v) => v,
                Err(_) => match default {
                    Some(d) => d.to_string(),
                    None => {
                        return Err(ConfigError::EnvVarNotFound {
                            var: var_name.to_string(),
                        })
                    }
                },
            };

            result = result.replace(full_match, &value);
        }

        Ok(result)
    }

    /// Validate configuration values.
    pub fn validate(&self, config: &DpdpConfig) -> Result<(), ConfigError> {
        let engine = &config.engine;

        if engine.compliance_threshold > 100 {
            return Err(invalid("engine.compliance_threshold must be at most 100"));
        }

        let periods = [
            ("consent.renewal_period_days", engine.consent.renewal_period_days, 1),
            ("rights.erasure_grace_period_days", engine.rights.erasure_grace_period_days, 0),
            ("retention.review_interval_days", engine.retention.review_interval_days, 1),
        ];
        for (setting, days, min) in periods {
            if !(min..=MAX_PERIOD_DAYS).contains(&days) {
                return Err(invalid(format!(
                    "engine.{setting} must be between {min} and {MAX_PERIOD_DAYS}"
                )));
            }
        }

        if engine.audit.client_recent_events == 0 || engine.audit.fleet_recent_events == 0 {
            return Err(invalid("engine.audit recent event limits must be greater than 0"));
        }

        engine
            .catalog
            .validate()
            .map_err(|e| invalid(format!("engine.catalog: {e}")))?;

        if !LoggingConfig::FORMATS.contains(&config.logging.format.as_str()) {
            return Err(invalid(format!(
                "logging.format must be one of {}",
                LoggingConfig::FORMATS.join(", ")
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StorageBackend;
    use std::fs;
    use tempfile::tempdir;

    fn write_config(dir: &Path, contents: &str) {
        let config_dir = dir.join(CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(CONFIG_FILE), contents).unwrap();
    }

    #[test]
    fn test_load_defaults_when_no_file() {
        let dir = tempdir().unwrap();
        let config = ConfigLoader::new(dir.path()).load().unwrap();
        assert_eq!(config.engine.compliance_threshold, 80);
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempdir().unwrap();
        let result = ConfigLoader::new(dir.path())
            .with_file(dir.path().join("missing.yaml"))
            .load();
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_load_config_from_yaml_file() {
        let dir = tempdir().unwrap();
        write_config(
            dir.path(),
            r#"
engine:
  compliance_threshold: 75
  consent:
    default_version: "2.1"
  audit:
    default_ip_address: 10.1.2.3
storage:
  backend: memory
logging:
  format: json
"#,
        );

        let config = ConfigLoader::new(dir.path()).load().unwrap();

        assert_eq!(config.engine.compliance_threshold, 75);
        assert_eq!(config.engine.consent.default_version, "2.1");
        assert_eq!(config.engine.audit.default_ip_address, "10.1.2.3");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.logging.format, "json");

        assert_eq!(config.engine.consent.renewal_period_days, 365);
        assert_eq!(config.engine.catalog.data_categories.len(), 5);
    }

    #[test]
    fn test_custom_catalog() {
        let dir = tempdir().unwrap();
        write_config(
            dir.path(),
            r#"
engine:
  catalog:
    data_categories:
      - category: Contact Details
        sensitivity: medium
        encryption_status: true
      - category: Device Logs
    processing_purposes:
      - purpose: Care Coordination
        legal_basis: Consent
        retention_period: 2 years
        data_categories: [Contact Details]
"#,
        );

        let config = ConfigLoader::new(dir.path()).load().unwrap();
        let catalog = &config.engine.catalog;
        assert_eq!(catalog.data_categories.len(), 2);
        assert!(catalog.data_categories[1].sensitivity.is_none());
        assert_eq!(catalog.processing_purposes[0].purpose, "Care Coordination");
    }

    #[test]
    fn test_env_var_expansion() {
        std::env::set_var("DPDP_TEST_EXPAND_VAR", "test_value");
        let loader = ConfigLoader::new(".");
        let result = loader.expand_env_vars("key: ${DPDP_TEST_EXPAND_VAR}").unwrap();
        assert_eq!(result, "key: test_value");
        std::env::remove_var("DPDP_TEST_EXPAND_VAR");
    }

    #[test]
    fn test_env_var_default() {
        let loader = ConfigLoader::new(".");
        let result = loader
            .expand_env_vars("key: ${DPDP_TEST_NONEXISTENT:-default}")
            .unwrap();
        assert_eq!(result, "key: default");
    }

    #[test]
    fn test_env_var_missing_error() {
        let loader = ConfigLoader::new(".");
        match loader.expand_env_vars("key: ${DPDP_TEST_MISSING_VAR}") {
            Err(ConfigError::EnvVarNotFound { var }) => assert_eq!(var, "DPDP_TEST_MISSING_VAR"),
            other => panic!("Expected EnvVarNotFound error, got {other:?}"),
        }
    }

    #[test]
    fn test_env_var_expansion_in_config() {
        std::env::set_var("DPDP_TEST_THRESHOLD", "85");

        let dir = tempdir().unwrap();
        write_config(
            dir.path(),
            r#"
engine:
  compliance_threshold: ${DPDP_TEST_THRESHOLD}
  rights:
    erasure_grace_period_days: ${DPDP_TEST_GRACE:-45}
"#,
        );

        let config = ConfigLoader::new(dir.path()).load().unwrap();
        assert_eq!(config.engine.compliance_threshold, 85);
        assert_eq!(config.engine.rights.erasure_grace_period_days, 45);

        std::env::remove_var("DPDP_TEST_THRESHOLD");
    }

    fn assert_invalid(config: DpdpConfig, expected: &str) {
        match ConfigLoader::new(".").validate(&config) {
            Err(ConfigError::ValidationError { message }) => {
                assert!(message.contains(expected), "{message} should mention {expected}");
            }
            other => panic!("Expected ValidationError for {expected}, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_errors() {
        let mut config = DpdpConfig::default();
        config.engine.compliance_threshold = 101;
        assert_invalid(config, "compliance_threshold");

        let mut config = DpdpConfig::default();
        config.engine.consent.renewal_period_days = 0;
        assert_invalid(config, "renewal_period_days");

        let mut config = DpdpConfig::default();
        config.engine.rights.erasure_grace_period_days = -1;
        assert_invalid(config, "erasure_grace_period_days");

        let mut config = DpdpConfig::default();
        config.engine.rights.erasure_grace_period_days = i64::MAX;
        assert_invalid(config, "erasure_grace_period_days must be between 0 and 36500");

        let mut config = DpdpConfig::default();
        config.engine.retention.review_interval_days = MAX_PERIOD_DAYS + 1;
        assert_invalid(config, "review_interval_days");

        let mut config = DpdpConfig::default();
        config.engine.audit.fleet_recent_events = 0;
        assert_invalid(config, "recent event limits");

        let mut config = DpdpConfig::default();
        config.logging.format = "xml".to_string();
        assert_invalid(config, "logging.format");

        let mut config = DpdpConfig::default();
        let copy = config.engine.catalog.processing_purposes[0].clone();
        config.engine.catalog.processing_purposes.push(copy);
        assert_invalid(config, "duplicate processing purpose");

        assert!(ConfigLoader::new(".").validate(&DpdpConfig::default()).is_ok());
    }

    #[test]
    fn test_parse_error_with_line_number() {
        let dir = tempdir().unwrap();
        write_config(
            dir.path(),
            r#"
engine:
  compliance_threshold: 80
  catalog: [unclosed
"#,
        );

        match ConfigLoader::new(dir.path()).load() {
            Err(ConfigError::ParseError { line, .. }) => assert!(line.is_some()),
            other => panic!("Expected ParseError with line number, got {other:?}"),
        }
    }
}
