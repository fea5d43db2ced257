//! Compliance impact levels for audit entries.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strum::{Display, EnumIter, EnumString};

/// How much an audited event affects the subject's compliance posture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumIter, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ComplianceImpact {
    /// No effect on compliance.
    None,
    /// Routine event.
    Low,
    /// Event that changes what may be processed.
    Medium,
    /// Event that warrants review (counted as high-risk in fleet reports).
    High,
}

impl ComplianceImpact {
    /// Numeric value for comparison (higher = more impact).
    pub fn level(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// Check if this impact meets a minimum threshold.
    pub fn meets_threshold(&self, threshold: Self) -> bool {
        self.level() >= threshold.level()
    }

    /// Whether fleet reporting counts this as a high-risk event.
    pub fn is_high_risk(&self) -> bool {
        matches!(self, Self::High)
    }
}

impl PartialOrd for ComplianceImpact {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ComplianceImpact {
    fn cmp(&self, other: &Self) -> Ordering {
        self.level().cmp(&other.level())
    }
}

impl Default for ComplianceImpact {
    fn default() -> Self {
        Self::Low
    }
}
