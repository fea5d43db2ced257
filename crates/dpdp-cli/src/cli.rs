//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};
use dpdp_common_config::{ConfigLoader, DpdpConfig, LoggingConfig, StorageBackend, StorageConfig};
use dpdp_common_log::{spans, LogConfig, LogFormat, LogLevel};
use dpdp_compliance::{open_connection, ComplianceEngine, EngineConfig};
use tracing::debug;

use crate::commands::{
    AuditCommand, ConsentCommand, CreateCommand, EventCommand, ExerciseCommand, ExportCommand,
    FleetCommand, LogCommand, RenewalsCommand, ReportCommand, ResolveCommand, ShowCommand,
    VerifyCommand,
};
use crate::error::CliError;

/// DPDP compliance records and audit trail.
///
/// Tracks consent, data-subject rights requests and compliance scores per
/// client, backed by an append-only audit log.
#[derive(Debug, Parser)]
#[command(
    name = "dpdp",
    author,
    version,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all logging except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "DPDP_CONFIG",
        value_hint = ValueHint::FilePath
    )]
    pub config: Option<PathBuf>,

    /// SQLite database file, overriding the configured storage
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub database: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    // === Records ===
    /// Create the compliance record for a new client
    Create(CreateCommand),

    /// Show a client's compliance record
    Show(ShowCommand),

    /// Record that a client gave or refused consent
    Consent(ConsentCommand),

    /// Flag consents whose renewal date has passed
    Renewals(RenewalsCommand),

    // === Rights ===
    /// Exercise a data-subject right on behalf of a client
    Exercise(ExerciseCommand),

    /// Fulfil or reject a pending rights request
    Resolve(ResolveCommand),

    /// Export everything held about a client
    Export(ExportCommand),

    // === Reporting ===
    /// Compliance report for one client
    Report(ReportCommand),

    /// Compliance report across all clients
    Fleet(FleetCommand),

    // === Audit ===
    /// Show one client's audit trail
    Audit(AuditCommand),

    /// Show the whole audit log
    Log(LogCommand),

    /// Append an externally raised audit event
    Event(EventCommand),

    /// Verify the audit log hash chain
    Verify(VerifyCommand),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Show(_) => "show",
            Self::Consent(_) => "consent",
            Self::Renewals(_) => "renewals",
            Self::Exercise(_) => "exercise",
            Self::Resolve(_) => "resolve",
            Self::Export(_) => "export",
            Self::Report(_) => "report",
            Self::Fleet(_) => "fleet",
            Self::Audit(_) => "audit",
            Self::Log(_) => "log",
            Self::Event(_) => "event",
            Self::Verify(_) => "verify",
        }
    }
}

impl Cli {
    /// Load configuration from `--config` or the project default.
    pub fn load_config(&self) -> Result<DpdpConfig, CliError> {
        let mut loader = ConfigLoader::new(".");
        if let Some(path) = &self.config {
            loader = loader.with_file(path);
        }
        let mut config = loader.load()?;

        if let Some(database) = &self.database {
            config.storage.backend = StorageBackend::Sqlite;
            config.storage.database_path = database.clone();
        }
        Ok(config)
    }

    /// Install the tracing subscriber.
    ///
    /// `-v`/`-q` win over the environment, which wins over the config file.
    pub fn init_logging(&self, logging: &LoggingConfig) -> Result<(), CliError> {
        let mut config = LogConfig {
            filter: logging.level.clone(),
            format: LogFormat::parse(&logging.format).unwrap_or_default(),
            file_path: logging.file.clone(),
            ..LogConfig::default()
        }
        .apply_env();

        if let Some(level) = LogLevel::from_verbosity(self.verbose, self.quiet) {
            config = config.with_level(level);
        }
        dpdp_common_log::init(&config)?;
        Ok(())
    }

    /// Execute the selected command
    pub fn execute(self, config: DpdpConfig) -> Result<(), CliError> {
        let engine = open_engine(&config.storage, config.engine)?;
        let ctx = CommandContext {
            engine,
            format: self.format,
        };

        let name = self.command.name();
        let span = spans::command_span(name);
        let _guard = span.enter();
        let timer = spans::Timer::start(name);

        let result = match self.command {
            Command::Create(cmd) => cmd.execute(&ctx),
            Command::Show(cmd) => cmd.execute(&ctx),
            Command::Consent(cmd) => cmd.execute(&ctx),
            Command::Renewals(cmd) => cmd.execute(&ctx),
            Command::Exercise(cmd) => cmd.execute(&ctx),
            Command::Resolve(cmd) => cmd.execute(&ctx),
            Command::Export(cmd) => cmd.execute(&ctx),
            Command::Report(cmd) => cmd.execute(&ctx),
            Command::Fleet(cmd) => cmd.execute(&ctx),
            Command::Audit(cmd) => cmd.execute(&ctx),
            Command::Log(cmd) => cmd.execute(&ctx),
            Command::Event(cmd) => cmd.execute(&ctx),
            Command::Verify(cmd) => cmd.execute(&ctx),
        };

        timer.finish();
        if let Err(e) = &result {
            spans::record_error(e);
        }
        result
    }
}

/// Build the engine over the configured storage.
pub fn open_engine(storage: &StorageConfig, config: EngineConfig) -> Result<ComplianceEngine, CliError> {
    match storage.backend {
        StorageBackend::Memory => {
            debug!("using in-memory storage");
            Ok(ComplianceEngine::in_memory(config))
        }
        StorageBackend::Sqlite => {
            debug!(path = %storage.database_path.display(), "opening database");
            let conn = open_connection(&storage.database_path)?;
            Ok(ComplianceEngine::sqlite(conn, config)?)
        }
    }
}

/// Context passed to all commands
pub struct CommandContext {
    pub engine: ComplianceEngine,
    pub format: OutputFormat,
}
