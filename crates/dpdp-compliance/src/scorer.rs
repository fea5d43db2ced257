//! Compliance scoring.
//!
//! The score is a pure function of a record's current state:
//!
//! | Criterion                                        | Weight |
//! |--------------------------------------------------|--------|
//! | consent given                                    | 30     |
//! | share of data categories classified              | 20     |
//! | share of purposes with legal basis and retention | 20     |
//! | retention period and deletion schedule recorded  | 15     |
//! | share of rights capabilities enabled             | 15     |

use crate::model::{ComplianceRecord, RightsCapabilities};

const CONSENT_WEIGHT: f64 = 30.0;
const CLASSIFICATION_WEIGHT: f64 = 20.0;
const PURPOSE_WEIGHT: f64 = 20.0;
const RETENTION_WEIGHT: f64 = 15.0;
const RIGHTS_WEIGHT: f64 = 15.0;

/// Score a record in `0..=100`.
pub fn score(record: &ComplianceRecord) -> u8 {
    let mut total = 0.0;

    if record.consent_status.consent_given {
        total += CONSENT_WEIGHT;
    }

    let classified = record
        .data_categories
        .iter()
        .filter(|c| c.is_classified())
        .count();
    total += CLASSIFICATION_WEIGHT * fraction(classified, record.data_categories.len());

    let documented = record
        .processing_purposes
        .iter()
        .filter(|p| p.is_documented())
        .count();
    total += PURPOSE_WEIGHT * fraction(documented, record.processing_purposes.len());

    if record.data_retention.is_documented() {
        total += RETENTION_WEIGHT;
    }

    let enabled = record.data_subject_rights.capabilities.enabled_count();
    total += RIGHTS_WEIGHT * fraction(enabled, RightsCapabilities::COUNT);

    total.round().clamp(0.0, 100.0) as u8
}

// An empty list earns nothing.
fn fraction(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}
