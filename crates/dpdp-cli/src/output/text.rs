//! Text renderings of engine results.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use dpdp_compliance::{
    AuditLogEntry, ClientComplianceReport, ComplianceRecord, ConsentStatus, ExercisedRight,
    FleetComplianceReport, IntegrityReport,
};
use serde::Serialize;

use super::FormattedOutput;

const LABEL_WIDTH: usize = 20;

fn line(out: &mut String, label: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "{label:<LABEL_WIDTH$} {value}");
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn consent_summary(consent: &ConsentStatus) -> String {
    let state = if consent.consent_given {
        "given"
    } else if consent.withdrawal_date.is_some() {
        "withdrawn"
    } else {
        "not given"
    };
    let mut summary = format!("{state} (version {})", consent.consent_version);
    if consent.renewal_required {
        summary.push_str(", renewal required");
    }
    summary
}

fn entry_line(entry: &AuditLogEntry) -> String {
    format!(
        "{}  {:<34} {:<8} {:<6} {}",
        timestamp(&entry.timestamp),
        entry.action.to_string(),
        entry.user_id.to_string(),
        entry.compliance_impact.to_string(),
        entry.client_id
    )
}

fn right_line(right: &ExercisedRight) -> String {
    let mut text = format!(
        "{}  {:<16} {}",
        right.request_id,
        right.right_type.to_string(),
        right.status
    );
    if let Some(reason) = &right.reason {
        let _ = write!(text, " ({reason})");
    }
    text
}

impl FormattedOutput for ComplianceRecord {
    fn format_text(&self) -> String {
        let mut out = String::new();
        line(&mut out, "Client:", &self.client_id);
        line(&mut out, "Compliance score:", format!("{}/100", self.compliance_score));
        line(&mut out, "Consent:", consent_summary(&self.consent_status));
        line(&mut out, "Data categories:", self.data_categories.len());
        line(&mut out, "Processing purposes:", self.processing_purposes.len());
        line(&mut out, "Retention period:", &self.data_retention.retention_period);
        if let Some(at) = &self.data_retention.scheduled_deletion {
            line(&mut out, "Deletion scheduled:", timestamp(at));
        }
        line(&mut out, "Rights requests:", self.exercised_rights().len());
        for right in self.exercised_rights() {
            let _ = writeln!(out, "  {}", right_line(right));
        }
        line(&mut out, "Last updated:", timestamp(&self.last_updated));
        out.trim_end().to_string()
    }
}

impl FormattedOutput for ClientComplianceReport {
    fn format_text(&self) -> String {
        let mut out = String::new();
        line(&mut out, "Client:", &self.client_id);
        line(&mut out, "Compliance score:", format!("{}/100", self.compliance_score));
        line(&mut out, "Consent:", consent_summary(&self.consent_status));
        line(&mut out, "Audit events:", self.audit_summary.total_events);
        if self.audit_summary.compliance_issues.is_empty() {
            line(&mut out, "Issues:", "none");
        } else {
            line(&mut out, "Issues:", "");
            for issue in &self.audit_summary.compliance_issues {
                let _ = writeln!(out, "  - {issue}");
            }
        }
        if !self.audit_summary.recent_events.is_empty() {
            let _ = writeln!(out, "Recent events:");
            for entry in &self.audit_summary.recent_events {
                let _ = writeln!(out, "  {}", entry_line(entry));
            }
        }
        out.trim_end().to_string()
    }
}

impl FormattedOutput for FleetComplianceReport {
    fn format_text(&self) -> String {
        let mut out = String::new();
        line(&mut out, "Clients:", self.total_clients);
        line(&mut out, "Compliant:", self.compliant_clients);
        line(&mut out, "Compliance rate:", format!("{:.1}%", self.compliance_rate));
        line(&mut out, "Audit events:", self.audit_summary.total_audit_events);
        line(&mut out, "High-risk events:", self.audit_summary.high_risk_events);
        if !self.common_issues.is_empty() {
            let _ = writeln!(out, "Common issues:");
            for issue in &self.common_issues {
                let _ = writeln!(out, "  {:<24} {}", issue.issue.to_string(), issue.count);
            }
        }
        out.trim_end().to_string()
    }
}

impl FormattedOutput for AuditLogEntry {
    fn format_text(&self) -> String {
        let mut out = String::new();
        line(&mut out, "Entry:", self.id);
        line(&mut out, "Client:", &self.client_id);
        line(&mut out, "Action:", &self.action);
        line(&mut out, "Actor:", &self.user_id);
        line(&mut out, "Impact:", self.compliance_impact);
        line(&mut out, "Data category:", &self.data_category);
        line(&mut out, "Timestamp:", timestamp(&self.timestamp));
        out.trim_end().to_string()
    }
}

impl FormattedOutput for IntegrityReport {
    fn format_text(&self) -> String {
        match self.first_broken {
            None => format!("✓ audit chain intact ({} entries)", self.entries_checked),
            Some(seq) => format!(
                "✗ audit chain broken at entry {seq} ({} entries checked)",
                self.entries_checked
            ),
        }
    }
}

/// A page of audit entries.
#[derive(Debug, Serialize)]
pub struct AuditEntries {
    /// Entries in the trail before the limit was applied.
    pub total: usize,
    pub entries: Vec<AuditLogEntry>,
}

impl FormattedOutput for AuditEntries {
    fn format_text(&self) -> String {
        if self.entries.is_empty() {
            return "no audit entries".to_string();
        }
        let mut out = String::new();
        for entry in &self.entries {
            let _ = writeln!(out, "{}", entry_line(entry));
        }
        if self.entries.len() < self.total {
            let _ = writeln!(out, "({} of {} entries)", self.entries.len(), self.total);
        }
        out.trim_end().to_string()
    }
}

/// Clients flagged for consent renewal.
#[derive(Debug, Serialize)]
pub struct FlaggedRenewals {
    pub as_of: DateTime<Utc>,
    pub flagged_clients: Vec<String>,
}

impl FormattedOutput for FlaggedRenewals {
    fn format_text(&self) -> String {
        if self.flagged_clients.is_empty() {
            return format!("no consents due for renewal as of {}", timestamp(&self.as_of));
        }
        let mut out = format!(
            "{} consent(s) flagged for renewal as of {}:\n",
            self.flagged_clients.len(),
            timestamp(&self.as_of)
        );
        for client in &self.flagged_clients {
            let _ = writeln!(out, "  {client}");
        }
        out.trim_end().to_string()
    }
}

/// State of one rights request after a command.
#[derive(Debug, Serialize)]
pub struct RequestOutcome {
    pub client_id: String,
    pub request: ExercisedRight,
}

impl FormattedOutput for RequestOutcome {
    fn format_text(&self) -> String {
        let mut out = String::new();
        line(&mut out, "Client:", &self.client_id);
        line(&mut out, "Request:", self.request.request_id);
        line(&mut out, "Right:", self.request.right_type.display_name());
        line(&mut out, "Status:", self.request.status);
        if let Some(reason) = &self.request.reason {
            line(&mut out, "Reason:", reason);
        }
        if let Some(at) = &self.request.fulfillment_date {
            line(&mut out, "Fulfilled:", timestamp(at));
        }
        out.trim_end().to_string()
    }
}
