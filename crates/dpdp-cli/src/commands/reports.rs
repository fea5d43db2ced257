//! Reporting commands.

use clap::Parser;

use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::print_output;

/// Compliance report for one client
#[derive(Debug, Parser)]
pub struct ReportCommand {
    /// Client identifier
    pub client_id: String,
}

impl ReportCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let report = ctx.engine.get_compliance_report(&self.client_id)?;
        print_output(ctx, &report)
    }
}

/// Compliance report across all clients
#[derive(Debug, Parser)]
pub struct FleetCommand {}

impl FleetCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let report = ctx.engine.get_fleet_compliance_report()?;
        print_output(ctx, &report)
    }
}
