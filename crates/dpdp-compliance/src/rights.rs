//! Data-subject-rights request processing.
//!
//! Every request is recorded as a pending [`ExercisedRight`] and audited
//! before its handler runs. Handlers then resolve it synchronously:
//!
//! - access, portability, correction and consent withdrawal are fulfilled
//! - erasure is fulfilled or rejected by [`assess_erasure`]
//!
//! With `rights.manual_correction_review` set, corrections stay pending
//! until [`ComplianceEngine::resolve_request`] closes them.

use crate::config::days_after;
use crate::engine::ComplianceEngine;
use crate::error::{ComplianceError, ComplianceResult};
use crate::export::{SubjectDataExport, PORTABLE_SCHEMA_VERSION};
use crate::model::{ComplianceRecord, ExercisedRight, Resolution, RightType};
use chrono::{DateTime, Utc};
use dpdp_audit_types::{AuditAction, AuditActor, AuditLogEntry, RequestId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

/// A processing purpose that prevents erasure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockingPurpose {
    pub purpose: String,
    pub legal_basis: String,
}

/// Result of the erasure eligibility check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErasureAssessment {
    pub can_erase: bool,
    pub blocking_purposes: Vec<BlockingPurpose>,
}

impl ErasureAssessment {
    /// Reason recorded on a rejected erasure request.
    pub fn rejection_reason(&self) -> String {
        let purposes: Vec<String> = self
            .blocking_purposes
            .iter()
            .map(|p| format!("{} ({})", p.purpose, p.legal_basis))
            .collect();
        format!("Erasure blocked by processing purposes: {}", purposes.join(", "))
    }
}

/// Check whether a record's data may be erased.
///
/// Any purpose whose legal basis contains one of `blocking_bases` blocks
/// erasure.
pub fn assess_erasure(record: &ComplianceRecord, blocking_bases: &[String]) -> ErasureAssessment {
    let blocking_purposes: Vec<BlockingPurpose> = record
        .processing_purposes
        .iter()
        .filter(|p| {
            blocking_bases
                .iter()
                .any(|basis| p.legal_basis.contains(basis.as_str()))
        })
        .map(|p| BlockingPurpose {
            purpose: p.purpose.clone(),
            legal_basis: p.legal_basis.clone(),
        })
        .collect();

    ErasureAssessment {
        can_erase: blocking_purposes.is_empty(),
        blocking_purposes,
    }
}

/// What a handler did with a request.
struct Outcome {
    resolution: Option<Resolution>,
    entries: Vec<AuditLogEntry>,
}

impl Outcome {
    fn fulfilled(entries: Vec<AuditLogEntry>) -> Self {
        Self {
            resolution: Some(Resolution::Fulfilled),
            entries,
        }
    }
}

fn resolve_in(
    record: &mut ComplianceRecord,
    request_id: RequestId,
    resolution: Resolution,
    at: DateTime<Utc>,
) -> ComplianceResult<ExercisedRight> {
    let client_id = record.client_id.clone();
    let right = record
        .exercised_right_mut(request_id)
        .ok_or(ComplianceError::RequestNotFound {
            client_id,
            request_id,
        })?;
    right
        .resolve(resolution, at)
        .map_err(|status| ComplianceError::InvalidTransition { request_id, status })?;
    Ok(right.clone())
}

impl ComplianceEngine {
    /// Exercise a data-subject right.
    ///
    /// The returned id locates the request in the record's rights history,
    /// where its final status can be read.
    #[instrument(skip(self, request_details))]
    pub fn exercise_right(
        &self,
        client_id: &str,
        right_type: RightType,
        request_details: Value,
    ) -> ComplianceResult<RequestId> {
        let request_id = RequestId::new();

        let right = self.with_client_lock(client_id, || {
            let mut record = self.get_record(client_id)?;

            let received_at = Utc::now();
            record
                .data_subject_rights
                .exercised_rights
                .push(ExercisedRight::pending(request_id, right_type, received_at));
            let received = self
                .entry(client_id, AuditAction::DataSubjectRightExercised)
                .actor(AuditActor::Client)
                .timestamp(received_at)
                .detail("rightType", right_type)
                .detail("requestId", request_id)
                .detail("requestDetails", &request_details)
                .build();
            self.persist(&mut record, received_at, vec![received])?;

            let now = Utc::now();
            let outcome = if record.data_subject_rights.capabilities.allows(right_type) {
                self.handle(&mut record, right_type, request_id, &request_details, now)?
            } else {
                let reason = format!("{} is not enabled for this record", right_type.display_name());
                warn!(%request_id, %right_type, "right not enabled");
                Outcome {
                    resolution: Some(Resolution::Rejected { reason }),
                    entries: Vec::new(),
                }
            };

            if let Some(resolution) = outcome.resolution {
                resolve_in(&mut record, request_id, resolution, now)?;
            }
            self.persist(&mut record, now, outcome.entries)?;

            record
                .exercised_right(request_id)
                .cloned()
                .ok_or_else(|| ComplianceError::RequestNotFound {
                    client_id: client_id.to_string(),
                    request_id,
                })
        })?;

        info!(%request_id, %right_type, status = %right.status, "data subject request processed");
        Ok(request_id)
    }

    /// Close a pending request.
    ///
    /// Used for requests that need manual review, such as corrections.
    #[instrument(skip(self))]
    pub fn resolve_request(
        &self,
        client_id: &str,
        request_id: RequestId,
        resolution: Resolution,
    ) -> ComplianceResult<ExercisedRight> {
        let (right, _) = self.modify_record(client_id, |record, now| {
            let right = resolve_in(record, request_id, resolution, now)?;
            let entry = self
                .entry(client_id, AuditAction::DataSubjectRequestResolved)
                .timestamp(now)
                .detail("requestId", request_id)
                .detail("rightType", right.right_type)
                .detail("status", right.status)
                .detail("reason", &right.reason)
                .build();
            Ok((right, vec![entry]))
        })?;

        info!(%request_id, status = %right.status, "data subject request resolved");
        Ok(right)
    }

    fn handle(
        &self,
        record: &mut ComplianceRecord,
        right_type: RightType,
        request_id: RequestId,
        request_details: &Value,
        now: DateTime<Utc>,
    ) -> ComplianceResult<Outcome> {
        match right_type {
            RightType::Access => self.handle_access(record, request_id, now),
            RightType::Correction => Ok(self.handle_correction(record, request_id, request_details, now)),
            RightType::Erasure => self.handle_erasure(record, request_id, now),
            RightType::Portability => self.handle_portability(record, request_id, now),
            RightType::WithdrawConsent => Ok(self.handle_withdrawal(record, request_id, now)),
        }
    }

    fn handle_access(
        &self,
        record: &ComplianceRecord,
        request_id: RequestId,
        now: DateTime<Utc>,
    ) -> ComplianceResult<Outcome> {
        let export = self.subject_export(record, now)?;
        let entry = self
            .entry(&record.client_id, AuditAction::AccessRequestProcessed)
            .timestamp(now)
            .detail("requestId", request_id)
            .detail("dataExported", SubjectDataExport::SECTIONS)
            .detail("rightsHistoryLength", export.exercised_rights.len())
            .build();
        Ok(Outcome::fulfilled(vec![entry]))
    }

    // Corrections are logged, never applied to the record.
    fn handle_correction(
        &self,
        record: &ComplianceRecord,
        request_id: RequestId,
        request_details: &Value,
        now: DateTime<Utc>,
    ) -> Outcome {
        // A payload without a `corrections` key is itself the correction.
        let corrections = request_details
            .get("corrections")
            .unwrap_or(request_details)
            .clone();
        let entry = self
            .entry(&record.client_id, AuditAction::CorrectionRequestProcessed)
            .timestamp(now)
            .detail("requestId", request_id)
            .detail("corrections", corrections)
            .build();

        if self.config().rights.manual_correction_review {
            return Outcome {
                resolution: None,
                entries: vec![entry],
            };
        }
        Outcome::fulfilled(vec![entry])
    }

    fn handle_erasure(
        &self,
        record: &mut ComplianceRecord,
        request_id: RequestId,
        now: DateTime<Utc>,
    ) -> ComplianceResult<Outcome> {
        let rights = &self.config().rights;
        let assessment = assess_erasure(record, &rights.erasure_blocking_bases);

        if !assessment.can_erase {
            let reason = assessment.rejection_reason();
            warn!(%request_id, blocking = assessment.blocking_purposes.len(), "erasure rejected");
            let entry = self
                .entry(&record.client_id, AuditAction::ErasureRequestProcessed)
                .timestamp(now)
                .detail("requestId", request_id)
                .detail("canErase", false)
                .detail("scheduledForDeletion", false)
                .detail("blockingPurposes", &assessment.blocking_purposes)
                .build();
            return Ok(Outcome {
                resolution: Some(Resolution::Rejected { reason }),
                entries: vec![entry],
            });
        }

        let scheduled = days_after(
            now,
            rights.erasure_grace_period_days,
            "rights.erasure_grace_period_days",
        )?;
        record.data_retention.scheduled_deletion = Some(scheduled);

        let scheduled_entry = self
            .entry(&record.client_id, AuditAction::DataDeletionScheduled)
            .timestamp(now)
            .detail("requestId", request_id)
            .detail("scheduledDate", scheduled)
            .build();
        let processed = self
            .entry(&record.client_id, AuditAction::ErasureRequestProcessed)
            .timestamp(now)
            .detail("requestId", request_id)
            .detail("canErase", true)
            .detail("scheduledForDeletion", true)
            .detail("scheduledDate", scheduled)
            .build();
        Ok(Outcome::fulfilled(vec![scheduled_entry, processed]))
    }

    fn handle_portability(
        &self,
        record: &ComplianceRecord,
        request_id: RequestId,
        now: DateTime<Utc>,
    ) -> ComplianceResult<Outcome> {
        let portable = self.portable_export(record, now)?;
        let entry = self
            .entry(&record.client_id, AuditAction::PortabilityRequestProcessed)
            .timestamp(now)
            .detail("requestId", request_id)
            .detail("format", "JSON")
            .detail("schemaVersion", PORTABLE_SCHEMA_VERSION)
            .detail("sizeBytes", portable.size_bytes()?)
            .build();
        Ok(Outcome::fulfilled(vec![entry]))
    }

    fn handle_withdrawal(
        &self,
        record: &mut ComplianceRecord,
        request_id: RequestId,
        now: DateTime<Utc>,
    ) -> Outcome {
        record.consent_status.consent_given = false;
        record.consent_status.withdrawal_date = Some(now);

        let entry = self
            .entry(&record.client_id, AuditAction::ConsentWithdrawn)
            .actor(AuditActor::Client)
            .timestamp(now)
            .detail("requestId", request_id)
            .detail("withdrawalDate", now)
            .build();
        Outcome::fulfilled(vec![entry])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::model::RequestStatus;
    use chrono::Duration;
    use dpdp_audit_log::SortOrder;
    use serde_json::json;
    use test_case::test_case;

    fn engine() -> ComplianceEngine {
        let engine = ComplianceEngine::in_memory(EngineConfig::default());
        engine.create_record("c-1").unwrap();
        engine
    }

    fn actions(engine: &ComplianceEngine) -> Vec<AuditAction> {
        engine
            .audit_trail("c-1", SortOrder::Ascending)
            .unwrap()
            .iter()
            .map(|e| e.action.clone())
            .collect()
    }

    #[test_case("Consent (Section 7, DPDP Act 2023)", true ; "consent basis")]
    #[test_case("Contract", true ; "contract basis")]
    #[test_case("Legal Obligation (Section 9, DPDP Act 2023)", false ; "legal obligation")]
    #[test_case("Legitimate Interest", false ; "legitimate interest")]
    #[test_case("legal obligation", true ; "match is case sensitive")]
    fn test_erasure_eligibility(basis: &str, expected: bool) {
        let mut record = engine().get_record("c-1").unwrap();
        record.processing_purposes.truncate(1);
        record.processing_purposes[0].legal_basis = basis.to_string();

        let bases = EngineConfig::default().rights.erasure_blocking_bases;
        assert_eq!(assess_erasure(&record, &bases).can_erase, expected);
    }

    #[test]
    fn test_standard_catalog_blocks_erasure() {
        let engine = engine();
        let request_id = engine.exercise_right("c-1", RightType::Erasure, json!({})).unwrap();

        let record = engine.get_record("c-1").unwrap();
        let right = record.exercised_rights().last().unwrap();
        assert_eq!(right.request_id, request_id);
        assert_eq!(right.status, RequestStatus::Rejected);
        let reason = right.reason.as_deref().unwrap();
        assert!(reason.contains("Service Delivery"));
        assert!(reason.contains("Legal Compliance"));
        assert!(!reason.contains("Mental Health Treatment"));
        assert!(right.fulfillment_date.is_none());
        assert!(record.data_retention.scheduled_deletion.is_none());

        let trail = engine.audit_trail("c-1", SortOrder::Descending).unwrap();
        let processed = trail.iter().next().unwrap();
        assert_eq!(processed.action, AuditAction::ErasureRequestProcessed);
        assert_eq!(processed.detail("canErase"), Some(&json!(false)));
        assert_eq!(processed.detail("scheduledForDeletion"), Some(&json!(false)));
    }

    #[test]
    fn test_eligible_erasure_schedules_deletion() {
        let mut config = EngineConfig::default();
        config
            .catalog
            .processing_purposes
            .retain(|p| p.purpose == "Mental Health Treatment");
        let engine = ComplianceEngine::in_memory(config);
        engine.create_record("c-1").unwrap();

        let request_id = engine.exercise_right("c-1", RightType::Erasure, json!({})).unwrap();
        let record = engine.get_record("c-1").unwrap();
        let right = record.exercised_right(request_id).unwrap();
        assert_eq!(right.status, RequestStatus::Fulfilled);
        let fulfilled_at = right.fulfillment_date.unwrap();
        assert_eq!(
            record.data_retention.scheduled_deletion,
            Some(fulfilled_at + Duration::days(30))
        );

        assert_eq!(
            actions(&engine),
            vec![
                AuditAction::ComplianceRecordCreated,
                AuditAction::DataSubjectRightExercised,
                AuditAction::DataDeletionScheduled,
                AuditAction::ErasureRequestProcessed,
            ]
        );
    }

    #[test]
    fn test_withdraw_consent() {
        let engine = engine();
        engine.update_consent("c-1", true, "1.0").unwrap();
        let request_id = engine
            .exercise_right("c-1", RightType::WithdrawConsent, json!({}))
            .unwrap();

        let record = engine.get_record("c-1").unwrap();
        assert!(!record.consent_status.consent_given);
        assert!(record.consent_status.withdrawal_date.is_some());
        assert_eq!(record.exercised_right(request_id).unwrap().status, RequestStatus::Fulfilled);
        assert_eq!(record.compliance_score, 70);

        let trail = engine.audit_trail("c-1", SortOrder::Descending).unwrap();
        let withdrawn = trail.iter().next().unwrap();
        assert_eq!(withdrawn.action, AuditAction::ConsentWithdrawn);
        assert_eq!(withdrawn.user_id, AuditActor::Client);
    }

    #[test]
    fn test_access_and_portability_are_fulfilled() {
        let engine = engine();
        let access = engine.exercise_right("c-1", RightType::Access, json!({})).unwrap();
        let portability = engine
            .exercise_right("c-1", RightType::Portability, json!({}))
            .unwrap();

        let record = engine.get_record("c-1").unwrap();
        assert_eq!(record.exercised_right(access).unwrap().status, RequestStatus::Fulfilled);
        assert_eq!(
            record.exercised_right(portability).unwrap().status,
            RequestStatus::Fulfilled
        );

        let trail = engine.audit_trail("c-1", SortOrder::Ascending).unwrap();
        let access_entry = trail
            .iter()
            .find(|e| e.action == AuditAction::AccessRequestProcessed)
            .unwrap();
        assert_eq!(
            access_entry.detail("dataExported"),
            Some(&json!(["personal_data", "processing_activities", "consent_history", "exercised_rights"]))
        );
        let portability_entry = trail
            .iter()
            .find(|e| e.action == AuditAction::PortabilityRequestProcessed)
            .unwrap();
        assert_eq!(portability_entry.detail("format"), Some(&json!("JSON")));
    }

    #[test]
    fn test_correction_is_logged_and_fulfilled() {
        let engine = engine();
        let before = engine.get_record("c-1").unwrap();
        let request_id = engine
            .exercise_right(
                "c-1",
                RightType::Correction,
                json!({ "corrections": { "phone": "+91 98765 43210" } }),
            )
            .unwrap();

        let record = engine.get_record("c-1").unwrap();
        let right = record.exercised_right(request_id).unwrap();
        assert_eq!(right.status, RequestStatus::Fulfilled);
        assert!(right.fulfillment_date.is_some());
        assert_eq!(record.data_categories, before.data_categories);
        assert_eq!(record.processing_purposes, before.processing_purposes);

        let trail = engine.audit_trail("c-1", SortOrder::Descending).unwrap();
        let logged = trail.iter().next().unwrap();
        assert_eq!(logged.action, AuditAction::CorrectionRequestProcessed);
        assert_eq!(logged.detail("corrections"), Some(&json!({ "phone": "+91 98765 43210" })));
    }

    #[test]
    fn test_top_level_correction_payload_is_logged() {
        let engine = engine();
        engine
            .exercise_right("c-1", RightType::Correction, json!({ "phone": "+91 1" }))
            .unwrap();

        let trail = engine.audit_trail("c-1", SortOrder::Descending).unwrap();
        assert_eq!(
            trail.iter().next().unwrap().detail("corrections"),
            Some(&json!({ "phone": "+91 1" }))
        );
    }

    #[test]
    fn test_reviewed_correction_stays_pending_until_resolved() {
        let mut config = EngineConfig::default();
        config.rights.manual_correction_review = true;
        let engine = ComplianceEngine::in_memory(config);
        engine.create_record("c-1").unwrap();

        let request_id = engine
            .exercise_right("c-1", RightType::Correction, json!({ "email": "new@example.org" }))
            .unwrap();
        let record = engine.get_record("c-1").unwrap();
        assert_eq!(record.exercised_right(request_id).unwrap().status, RequestStatus::Pending);

        let right = engine
            .resolve_request("c-1", request_id, Resolution::Fulfilled)
            .unwrap();
        assert_eq!(right.status, RequestStatus::Fulfilled);
        assert!(right.fulfillment_date.is_some());

        let err = engine
            .resolve_request("c-1", request_id, Resolution::Rejected { reason: "late".into() })
            .unwrap_err();
        assert!(matches!(
            err,
            ComplianceError::InvalidTransition { status: RequestStatus::Fulfilled, .. }
        ));
        assert_eq!(actions(&engine).last(), Some(&AuditAction::DataSubjectRequestResolved));
    }

    #[test]
    fn test_resolving_a_synchronous_request_conflicts() {
        let engine = engine();
        let request_id = engine.exercise_right("c-1", RightType::Access, json!({})).unwrap();
        let err = engine
            .resolve_request("c-1", request_id, Resolution::Fulfilled)
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[test]
    fn test_resolve_unknown_request() {
        let engine = engine();
        let err = engine
            .resolve_request("c-1", RequestId::new(), Resolution::Fulfilled)
            .unwrap_err();
        assert!(matches!(err, ComplianceError::RequestNotFound { .. }));
        assert_eq!(actions(&engine).len(), 1);
    }

    #[test]
    fn test_disabled_right_is_recorded_and_rejected() {
        let mut config = EngineConfig::default();
        config.rights.enabled.right_to_portability = false;
        let engine = ComplianceEngine::in_memory(config);
        engine.create_record("c-1").unwrap();

        let request_id = engine
            .exercise_right("c-1", RightType::Portability, json!({}))
            .unwrap();
        let right = engine
            .get_record("c-1")
            .unwrap()
            .exercised_right(request_id)
            .cloned()
            .unwrap();
        assert_eq!(right.status, RequestStatus::Rejected);
        assert_eq!(
            right.reason.as_deref(),
            Some("Right to portability is not enabled for this record")
        );
        assert_eq!(
            actions(&engine),
            vec![AuditAction::ComplianceRecordCreated, AuditAction::DataSubjectRightExercised]
        );
    }

    #[test]
    fn test_missing_record_is_not_found() {
        let engine = ComplianceEngine::in_memory(EngineConfig::default());
        let err = engine
            .exercise_right("ghost", RightType::Access, json!({}))
            .unwrap_err();
        assert!(matches!(err, ComplianceError::NotFound { .. }));
        assert!(engine.audit_log(SortOrder::Ascending).unwrap().is_empty());
    }
}
