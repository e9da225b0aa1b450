//! SQLite store for the trade journal.
//!
//! Owns the journal schema: a ledger of applied versions, the registry of
//! migration steps, the runner that applies them, the bootstrap that creates
//! base tables, and JSON/file snapshots stamped with the schema version.
//! Collaborators call [`initialize`] once at startup and then issue plain SQL
//! against the resulting tables.

pub mod bootstrap;
pub mod connection;
pub mod ddl;
pub mod error;
pub mod introspect;
pub mod ledger;
pub mod runner;
pub mod step;
pub mod steps;
pub mod sync;

pub use bootstrap::{BootstrapInitializer, BootstrapReport};
pub use connection::JournalDb;
pub use error::{StoreError, StoreResult};
pub use ledger::LedgerEntry;
pub use runner::{
    Clock, MigrationOutcome, MigrationRunner, MigrationStatus, RollbackOutcome, SystemClock,
};
pub use step::{ColumnRename, MigrationRegistry, MigrationStep, StepContext, StepInfo};

use serde::Serialize;

/// What [`initialize`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitReport {
    pub migration: MigrationOutcome,
    pub bootstrap: BootstrapReport,
}

/// Bring `db` to the current schema: migrate, bootstrap, then verify the
/// result against the column manifest.
///
/// Any error means the store must not be used.
pub fn initialize(db: &JournalDb, registry: &MigrationRegistry) -> StoreResult<InitReport> {
    let migration = MigrationRunner::new(db, registry).migrate(None)?;
    let init = BootstrapInitializer::new(db);
    let bootstrap = init.run()?;
    init.verify()?;
    Ok(InitReport {
        migration,
        bootstrap,
    })
}
