//! Consent commands.

use chrono::{DateTime, Utc};
use clap::Parser;
use tracing::info;

use crate::args::parse_timestamp;
use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::{print_output, FlaggedRenewals};

/// Record that a client gave or refused consent
#[derive(Debug, Parser)]
pub struct ConsentCommand {
    /// Client identifier
    pub client_id: String,

    /// Record a refusal instead of consent
    #[arg(long)]
    pub refuse: bool,

    /// Version of the consent text agreed to (defaults to the configured version)
    #[arg(long = "consent-version", value_name = "VERSION")]
    pub consent_version: Option<String>,
}

impl ConsentCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let version = self
            .consent_version
            .as_deref()
            .unwrap_or(ctx.engine.config().consent.default_version.as_str());
        let record = ctx
            .engine
            .update_consent(&self.client_id, !self.refuse, version)?;
        print_output(ctx, &record)
    }
}

/// Flag consents whose renewal date has passed
#[derive(Debug, Parser)]
pub struct RenewalsCommand {
    /// Reference time (RFC 3339 or YYYY-MM-DD); defaults to now
    #[arg(long, value_parser = parse_timestamp)]
    pub as_of: Option<DateTime<Utc>>,
}

impl RenewalsCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let as_of = self.as_of.unwrap_or_else(Utc::now);
        let flagged_clients = ctx.engine.flag_due_consent_renewals(as_of)?;
        info!(flagged = flagged_clients.len(), "renewal sweep complete");
        print_output(
            ctx,
            &FlaggedRenewals {
                as_of,
                flagged_clients,
            },
        )
    }
}
