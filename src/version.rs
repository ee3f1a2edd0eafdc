use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::StoreError;

/// Ordered token identifying the installed schema revision.
///
/// Any ascending numbering works; date based versions like `2025120101`
/// (`YYYYMMDDNN`) are the convention.
pub type SchemaVersion = i64;

/// Persistence for the current schema version.
///
/// The runner reads the version once per run and writes it back after every
/// successfully applied step, so the stored value always names the highest
/// step that fully completed.
pub trait VersionStore {
    fn current(&self) -> Result<SchemaVersion, StoreError>;
    fn set(&mut self, version: SchemaVersion) -> Result<(), StoreError>;
}

/// In-memory version store, mostly useful for tests and dry runs.
///
/// Clones share the same version cell.
#[derive(Default, Clone)]
pub struct MemoryVersion(Arc<Mutex<SchemaVersion>>);

impl MemoryVersion {
    pub fn new(version: SchemaVersion) -> Self {
        Self(Arc::new(Mutex::new(version)))
    }
}

impl VersionStore for MemoryVersion {
    fn current(&self) -> Result<SchemaVersion, StoreError> {
        Ok(*self.0.lock())
    }

    fn set(&mut self, version: SchemaVersion) -> Result<(), StoreError> {
        *self.0.lock() = version;
        Ok(())
    }
}

/// Pairs a schema handle with an external version store.
///
/// [crate::SqliteSchema] keeps its version in the database itself, but a
/// custom backend may track it elsewhere. Steps receive the whole pair and
/// reach the schema through the `schema` field; the runner only talks to
/// `store`.
pub struct WithStore<S, V> {
    pub schema: S,
    pub store: V,
}

impl<S, V: VersionStore> VersionStore for WithStore<S, V> {
    fn current(&self) -> Result<SchemaVersion, StoreError> {
        self.store.current()
    }

    fn set(&mut self, version: SchemaVersion) -> Result<(), StoreError> {
        self.store.set(version)
    }
}
