//! Subject data export.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::{print_output, StatusOutput};

/// Export everything held about a client
///
/// The document is always JSON; `--format` only affects the status line
/// printed when writing to a file.
#[derive(Debug, Parser)]
pub struct ExportCommand {
    /// Client identifier
    pub client_id: String,

    /// Wrap the export in a versioned portable document
    #[arg(long)]
    pub portable: bool,

    /// Write the document to this file instead of stdout
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

impl ExportCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        if self.portable {
            let document = ctx.engine.export_portable_data(&self.client_id)?;
            self.emit(ctx, &document)
        } else {
            let document = ctx.engine.export_subject_data(&self.client_id)?;
            self.emit(ctx, &document)
        }
    }

    fn emit<T: Serialize>(&self, ctx: &CommandContext, document: &T) -> Result<(), CliError> {
        let json = serde_json::to_string_pretty(document).map_err(|e| CliError::Storage {
            message: format!("failed to serialize export: {e}"),
            source: Some(Box::new(e)),
        })?;

        match &self.output {
            Some(path) => {
                std::fs::write(path, &json).map_err(|e| CliError::io(path, e))?;
                print_output(
                    ctx,
                    &StatusOutput::success(format!(
                        "exported {} bytes for '{}' to {}",
                        json.len(),
                        self.client_id,
                        path.display()
                    )),
                )
            }
            None => {
                println!("{json}");
                Ok(())
            }
        }
    }
}
