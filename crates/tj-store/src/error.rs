//! Error types for the journal store.

use thiserror::Error;

/// Journal store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open or configure the database file (S001).
    #[error("[S001] Database connection failed: {0}")]
    ConnectionError(String),

    /// SQL execution error outside of a migration step (S002).
    #[error("[S002] Database query failed: {0}")]
    QueryError(String),

    /// Transaction management error (S003).
    #[error("[S003] Database transaction failed: {0}")]
    TransactionError(String),

    /// A migration step's `up` or `down` failed; its transaction was rolled back (S004).
    #[error("[S004] Migration v{version:03} failed: {source}")]
    StepApplication {
        version: u32,
        #[source]
        source: Box<StoreError>,
    },

    /// The ledger already holds a row for this version (S005).
    #[error("[S005] Schema version v{version:03} is already recorded in the ledger")]
    ConstraintViolation { version: u32 },

    /// The step registry could not be built (S006).
    #[error("[S006] Invalid migration registry: {0}")]
    RegistryError(String),

    /// A step has no `down` implementation (S007).
    #[error("[S007] Migration v{version:03} cannot be reverted")]
    Irreversible { version: u32 },

    /// Found a legacy table layout the step cannot reconcile on its own (S008).
    #[error("[S008] Legacy schema conflict: {0}")]
    LegacyConflict(String),

    /// Post-bootstrap schema does not match the column manifest (S009).
    #[error(
        "[S009] Schema drift in table '{table}': missing columns [{}], unexpected columns [{}]",
        .missing.join(", "),
        .unexpected.join(", ")
    )]
    SchemaDrift {
        table: String,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// Export or import of a data snapshot failed (S010).
    #[error("[S010] Data sync failed: {0}")]
    SyncError(String),

    /// IO error with file path context (S011).
    #[error("[S011] IO error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// SQLite driver error with preserved source chain (S012).
    #[error("[S012] SQLite error")]
    Sqlite(#[source] rusqlite::Error),
}

/// Result type alias for [`StoreError`].
pub type StoreResult<T> = Result<T, StoreError>;

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Sqlite(err)
    }
}

impl StoreError {
    /// Wrap a step failure with the version it belongs to.
    pub(crate) fn in_step(version: u32, source: StoreError) -> Self {
        StoreError::StepApplication {
            version,
            source: Box::new(source),
        }
    }
}
