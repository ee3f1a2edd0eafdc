//! Error types for savepoint.

use thiserror::Error;

use crate::version::SchemaVersion;

/// Failure of a single schema operation.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("table `{0}` does not exist")]
    NoSuchTable(String),

    #[error("column `{column}` does not exist on table `{table}`")]
    NoSuchColumn { table: String, column: String },

    #[error("{0}")]
    Unsupported(&'static str),
}

/// Failure to read or persist the current schema version.
#[derive(Error, Debug)]
#[error("version store failed")]
pub struct StoreError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

impl StoreError {
    pub fn new(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(cause.into())
    }
}

/// Failure of a migration run.
///
/// The plan errors are reported before anything is read or mutated. The
/// other variants carry the version of the step that was being processed;
/// everything committed before that step stays committed.
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("migration step {next} is declared after {prev}; targets must be ascending")]
    UnsortedSteps {
        prev: SchemaVersion,
        next: SchemaVersion,
    },

    #[error("two migration steps target version {0}")]
    DuplicateTarget(SchemaVersion),

    #[error("could not read the current schema version")]
    ReadVersion(#[source] StoreError),

    #[error("could not persist schema version {version}")]
    SaveVersion {
        version: SchemaVersion,
        #[source]
        source: StoreError,
    },

    #[error("migration step targeting version {target} failed")]
    StepFailed {
        target: SchemaVersion,
        #[source]
        source: SchemaError,
    },
}

/// Failure of a background task.
///
/// Whatever queue executes the task decides how to log or retry it.
#[derive(Error, Debug)]
#[error("task failed: {0}")]
pub struct TaskError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

impl TaskError {
    pub fn new(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(cause.into())
    }
}
