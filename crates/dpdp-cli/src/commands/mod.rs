//! Command implementations.

mod audit;
mod consent;
mod export;
mod records;
mod reports;
mod rights;

pub use audit::{AuditCommand, EventCommand, LogCommand, VerifyCommand};
pub use consent::{ConsentCommand, RenewalsCommand};
pub use export::ExportCommand;
pub use records::{CreateCommand, ShowCommand};
pub use reports::{FleetCommand, ReportCommand};
pub use rights::{ExerciseCommand, ResolveCommand};
