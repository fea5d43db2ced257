//! Consent lifecycle.

use crate::config::days_after;
use crate::engine::ComplianceEngine;
use crate::error::ComplianceResult;
use crate::model::{ComplianceRecord, ConsentStatus};
use chrono::{DateTime, Utc};
use dpdp_audit_types::AuditAction;
use tracing::{info, instrument};

impl ComplianceEngine {
    /// Record the subject's consent decision.
    ///
    /// Each call stamps a fresh consent date and renewal date and writes its
    /// own audit entry, so repeating a call keeps the history.
    #[instrument(skip(self))]
    pub fn update_consent(
        &self,
        client_id: &str,
        consent_given: bool,
        consent_version: &str,
    ) -> ComplianceResult<ComplianceRecord> {
        let renewal_days = self.config().consent.renewal_period_days;
        let (_, record) = self.modify_record(client_id, |record, now| {
            let renewal_due = days_after(now, renewal_days, "consent.renewal_period_days")?;
            record.consent_status = ConsentStatus {
                consent_given,
                consent_date: Some(now),
                consent_version: consent_version.to_string(),
                withdrawal_date: None,
                renewal_required: false,
                renewal_due: Some(renewal_due),
            };

            let entry = self
                .entry(client_id, AuditAction::ConsentUpdated)
                .timestamp(now)
                .detail("consentGiven", consent_given)
                .detail("consentVersion", consent_version)
                .build();
            Ok(((), vec![entry]))
        })?;

        info!(consent_given, score = record.compliance_score, "consent updated");
        Ok(record)
    }

    /// Flag every record whose consent renewal is due at `as_of`.
    ///
    /// Returns the flagged client ids. Records already flagged are skipped.
    #[instrument(skip(self))]
    pub fn flag_due_consent_renewals(&self, as_of: DateTime<Utc>) -> ComplianceResult<Vec<String>> {
        let mut flagged = Vec::new();

        for client_id in self.client_ids()? {
            let (due, _) = self.modify_record(&client_id, |record, now| {
                if !record.consent_status.renewal_is_due(as_of) {
                    return Ok((false, Vec::new()));
                }
                record.consent_status.renewal_required = true;

                let entry = self
                    .entry(&client_id, AuditAction::ConsentRenewalRequired)
                    .timestamp(now)
                    .detail("consentVersion", &record.consent_status.consent_version)
                    .detail("renewalDue", record.consent_status.renewal_due)
                    .build();
                Ok((true, vec![entry]))
            })?;

            if due {
                flagged.push(client_id);
            }
        }

        info!(flagged = flagged.len(), "consent renewals checked");
        Ok(flagged)
    }
}
