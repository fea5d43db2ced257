//! Entry point for the `dpdp` binary.

use std::process::ExitCode;

use clap::Parser;
use dpdp_cli::{Cli, CliError, Exit};
use dpdp_common_config::Environment;

fn main() -> ExitCode {
    // .env files must be loaded before clap reads DPDP_CONFIG
    let env = Environment::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                Exit::InvalidInput.into()
            } else {
                Exit::Success.into()
            };
        }
    };

    match env.map_err(CliError::from).and_then(|_| run(cli)) {
        Ok(()) => Exit::Success.into(),
        Err(e) => {
            tracing::debug!(code = e.code(), error = %e, "command failed");
            eprintln!("error[{}]: {e}", e.code());
            if let Some(hint) = e.hint() {
                eprintln!("  hint: {hint}");
            }
            e.exit().into()
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.load_config()?;
    cli.init_logging(&config.logging)?;
    cli.execute(config)
}
