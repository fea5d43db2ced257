//! Engine configuration.

use crate::catalog::Catalog;
use crate::error::{ComplianceError, ComplianceResult};
use crate::model::RightsCapabilities;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Longest period, in days, any day-count setting may hold.
pub const MAX_PERIOD_DAYS: i64 = 36_500;

/// `at` moved forward by a configured number of days.
///
/// Fails instead of overflowing when the setting is out of range.
pub(crate) fn days_after(
    at: DateTime<Utc>,
    days: i64,
    setting: &'static str,
) -> ComplianceResult<DateTime<Utc>> {
    Duration::try_days(days)
        .and_then(|period| at.checked_add_signed(period))
        .ok_or(ComplianceError::PeriodOutOfRange { setting, days })
}

/// Settings consumed by the compliance engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum score for a record to count as compliant.
    pub compliance_threshold: u8,
    pub consent: ConsentConfig,
    pub rights: RightsConfig,
    pub audit: AuditConfig,
    pub retention: RetentionTemplate,
    pub catalog: Catalog,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            compliance_threshold: 80,
            consent: ConsentConfig::default(),
            rights: RightsConfig::default(),
            audit: AuditConfig::default(),
            retention: RetentionTemplate::default(),
            catalog: Catalog::standard(),
        }
    }
}

/// Consent lifecycle settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsentConfig {
    /// Days between a consent update and its renewal date.
    pub renewal_period_days: i64,
    /// Consent version stamped on new records.
    pub default_version: String,
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            renewal_period_days: 365,
            default_version: "1.0".to_string(),
        }
    }
}

/// Data-subject-rights settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RightsConfig {
    /// Days between an accepted erasure request and the scheduled deletion.
    pub erasure_grace_period_days: i64,
    /// Legal-basis substrings that block erasure.
    pub erasure_blocking_bases: Vec<String>,
    /// Capability flags seeded into new records.
    pub enabled: RightsCapabilities,
    /// Leave correction requests pending until they are resolved by hand.
    pub manual_correction_review: bool,
}

impl Default for RightsConfig {
    fn default() -> Self {
        Self {
            erasure_grace_period_days: 30,
            erasure_blocking_bases: vec![
                "Legal Obligation".to_string(),
                "Legitimate Interest".to_string(),
            ],
            enabled: RightsCapabilities::default(),
            manual_correction_review: false,
        }
    }
}

/// Audit and reporting settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Address recorded on engine-generated entries.
    pub default_ip_address: String,
    /// Recent events listed in a per-client report.
    pub client_recent_events: usize,
    /// Recent events listed in the fleet report.
    pub fleet_recent_events: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            default_ip_address: dpdp_audit_types::DEFAULT_IP_ADDRESS.to_string(),
            client_recent_events: 10,
            fleet_recent_events: 20,
        }
    }
}

/// Retention policy seeded into new records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionTemplate {
    pub retention_period: String,
    pub deletion_schedule: String,
    pub archival_policy: String,
    pub review_interval_days: i64,
}

impl Default for RetentionTemplate {
    fn default() -> Self {
        Self {
            retention_period: "7 years from last session".to_string(),
            deletion_schedule: "Annual review and deletion".to_string(),
            archival_policy: "Secure archival for legal compliance".to_string(),
            review_interval_days: 365,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.compliance_threshold, 80);
        assert_eq!(config.consent.renewal_period_days, 365);
        assert_eq!(config.rights.erasure_grace_period_days, 30);
        assert_eq!(config.audit.default_ip_address, "127.0.0.1");
        assert_eq!(config.catalog.data_categories.len(), 5);
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"compliance_threshold": 90, "rights": {"erasure_grace_period_days": 7}}"#)
                .unwrap();
        assert_eq!(config.compliance_threshold, 90);
        assert_eq!(config.rights.erasure_grace_period_days, 7);
        assert_eq!(config.rights.erasure_blocking_bases.len(), 2);
        assert!(config.rights.enabled.right_to_erasure);
        assert_eq!(config.audit.fleet_recent_events, 20);
    }

    #[test]
    fn test_days_after_rejects_out_of_range_periods() {
        let now = Utc::now();
        assert_eq!(
            days_after(now, 30, "rights.erasure_grace_period_days").unwrap(),
            now + Duration::days(30)
        );
        let err = days_after(now, i64::MAX, "consent.renewal_period_days").unwrap_err();
        assert!(matches!(
            err,
            ComplianceError::PeriodOutOfRange { setting: "consent.renewal_period_days", .. }
        ));
        assert!(days_after(now, 400_000_000, "retention.review_interval_days").is_err());
    }
}
