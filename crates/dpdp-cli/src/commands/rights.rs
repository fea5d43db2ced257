//! Rights request commands.

use clap::{ArgGroup, Parser};
use dpdp_compliance::{RequestId, Resolution, RightType};
use serde_json::Value;

use crate::args::{parse_details, parse_right};
use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::{print_output, RequestOutcome};

/// Exercise a data-subject right on behalf of a client
#[derive(Debug, Parser)]
pub struct ExerciseCommand {
    /// Client identifier
    pub client_id: String,

    /// access, correction, erasure, portability or withdraw_consent
    #[arg(value_parser = parse_right)]
    pub right: RightType,

    /// Request payload as a JSON object, e.g. '{"corrections":{"email":"new@example.com"}}'
    #[arg(long, value_parser = parse_details, default_value = "{}")]
    pub details: Value,
}

impl ExerciseCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let request_id = ctx
            .engine
            .exercise_right(&self.client_id, self.right, self.details.clone())?;
        print_request(ctx, &self.client_id, request_id)
    }
}

/// Fulfil or reject a pending rights request
#[derive(Debug, Parser)]
#[command(group(ArgGroup::new("outcome").required(true).args(["fulfill", "reject"])))]
pub struct ResolveCommand {
    /// Client identifier
    pub client_id: String,

    /// Request identifier as printed by `exercise`
    pub request_id: RequestId,

    /// Mark the request fulfilled
    #[arg(long)]
    pub fulfill: bool,

    /// Reject the request with this reason
    #[arg(long, value_name = "REASON")]
    pub reject: Option<String>,
}

impl ResolveCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let resolution = match &self.reject {
            Some(reason) if reason.trim().is_empty() => {
                return Err(CliError::validation("--reject", "a rejection needs a reason"));
            }
            Some(reason) => Resolution::Rejected {
                reason: reason.clone(),
            },
            None => Resolution::Fulfilled,
        };
        let request = ctx
            .engine
            .resolve_request(&self.client_id, self.request_id, resolution)?;
        print_output(
            ctx,
            &RequestOutcome {
                client_id: self.client_id.clone(),
                request,
            },
        )
    }
}

fn print_request(ctx: &CommandContext, client_id: &str, request_id: RequestId) -> Result<(), CliError> {
    let record = ctx.engine.get_record(client_id)?;
    let request = record
        .exercised_right(request_id)
        .cloned()
        .ok_or_else(|| CliError::NotFound {
            message: format!("no request {request_id} for client '{client_id}'"),
            resource_type: "rights request",
            resource_name: client_id.to_string(),
        })?;
    print_output(
        ctx,
        &RequestOutcome {
            client_id: client_id.to_string(),
            request,
        },
    )
}
