//! DPDP compliance CLI library.
//!
//! Argument definitions, commands and output formatting for the `dpdp`
//! binary.

pub mod args;
pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, CommandContext, OutputFormat};
pub use error::{CliError, Exit};
