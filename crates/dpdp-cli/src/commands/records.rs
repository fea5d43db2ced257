//! Record commands.

use clap::Parser;

use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::print_output;

/// Create the compliance record for a new client
#[derive(Debug, Parser)]
pub struct CreateCommand {
    /// Client identifier
    pub client_id: String,
}

impl CreateCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let record = ctx.engine.create_record(&self.client_id)?;
        print_output(ctx, &record)
    }
}

/// Show a client's compliance record
#[derive(Debug, Parser)]
pub struct ShowCommand {
    /// Client identifier
    pub client_id: String,
}

impl ShowCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let record = ctx.engine.get_record(&self.client_id)?;
        print_output(ctx, &record)
    }
}
