//! Audit log commands.

use clap::Parser;
use dpdp_compliance::{AuditActor, AuditTrail, ComplianceImpact, SortOrder};
use serde_json::Value;
use tracing::error;

use crate::args::{parse_details, parse_impact};
use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::{print_output, AuditEntries};

/// Ordering and paging shared by the audit listings.
#[derive(Debug, clap::Args)]
pub struct TrailOptions {
    /// List oldest entries first
    #[arg(long)]
    pub oldest_first: bool,

    /// Show at most this many entries
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub limit: Option<u64>,
}

impl TrailOptions {
    fn order(&self) -> SortOrder {
        if self.oldest_first {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        }
    }

    fn page(&self, trail: AuditTrail) -> AuditEntries {
        let total = trail.len();
        let entries = match self.limit {
            Some(limit) => trail.head(usize::try_from(limit).unwrap_or(usize::MAX)),
            None => trail.into_vec(),
        };
        AuditEntries { total, entries }
    }
}

/// Show one client's audit trail
#[derive(Debug, Parser)]
pub struct AuditCommand {
    /// Client identifier
    pub client_id: String,

    #[command(flatten)]
    pub trail: TrailOptions,
}

impl AuditCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let trail = ctx
            .engine
            .audit_trail(&self.client_id, self.trail.order())?;
        print_output(ctx, &self.trail.page(trail))
    }
}

/// Show the whole audit log
#[derive(Debug, Parser)]
pub struct LogCommand {
    #[command(flatten)]
    pub trail: TrailOptions,
}

impl LogCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let log = ctx.engine.audit_log(self.trail.order())?;
        print_output(ctx, &self.trail.page(log))
    }
}

/// Append an externally raised audit event
#[derive(Debug, Parser)]
pub struct EventCommand {
    /// Client identifier
    pub client_id: String,

    /// Event name, e.g. SESSION_RECORDING_CONSENT_GIVEN
    pub action: String,

    /// Who caused the event: System, Client or any other name
    #[arg(long, default_value = "System")]
    pub actor: String,

    /// Event payload as a JSON object
    #[arg(long, value_parser = parse_details, default_value = "{}")]
    pub details: Value,

    /// Override the action's default impact (none, low, medium, high)
    #[arg(long, value_parser = parse_impact)]
    pub impact: Option<ComplianceImpact>,
}

impl EventCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let action = self.action.trim();
        if action.is_empty() {
            return Err(CliError::validation("ACTION", "event name must not be empty"));
        }
        let entry = ctx.engine.append_audit_event(
            &self.client_id,
            action,
            AuditActor::from(self.actor.as_str()),
            self.details.clone(),
            self.impact,
        )?;
        print_output(ctx, &entry)
    }
}

/// Verify the audit log hash chain
#[derive(Debug, Parser)]
pub struct VerifyCommand {}

impl VerifyCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let report = ctx.engine.verify_audit_integrity()?;
        print_output(ctx, &report)?;
        match report.first_broken {
            None => Ok(()),
            Some(sequence) => {
                error!(sequence, "audit log failed verification");
                Err(CliError::Storage {
                    message: format!("audit chain broken at entry {sequence}"),
                    source: None,
                })
            }
        }
    }
}
