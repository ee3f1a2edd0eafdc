//! Forward-only, versioned schema migrations for SQLite.
//!
//! A migration is a [Plan] of [Step]s, each gated by a target
//! [SchemaVersion]. Running a plan applies every step the database has not
//! seen yet, in ascending order, and commits the new version after each one,
//! so an interrupted upgrade resumes where it left off instead of starting
//! over. Steps guard their own mutations with the existence checks on
//! [SchemaEdit], which makes re-running a half-applied step harmless.
//!
//! Databases are opened through the [Config] -> [SqliteSchema] ->
//! [r2d2::Pool] chain:
//!
//! ```
//! use savepoint::{Config, Field, FieldType, Plan, SchemaEdit, SqliteSchema};
//!
//! let plan = Plan::new().step(2025112000, |db: &mut SqliteSchema| {
//!     let field = Field::new("approved", FieldType::Integer)
//!         .not_null()
//!         .default_to(0);
//!     if !db.field_exists("entry", &field.name)? {
//!         db.add_field("entry", &field)?;
//!     }
//!     Ok(())
//! });
//!
//! let config = Config::open_in_memory()
//!     .init_stmt("CREATE TABLE entry (id INTEGER PRIMARY KEY) STRICT;");
//! let mut db = SqliteSchema::open(config).unwrap();
//! assert_eq!(plan.run(&mut db).unwrap(), 2025112000);
//! ```
//!
//! The version lives in the `user_version` pragma, but any [VersionStore]
//! can take its place, and any [SchemaEdit] implementation can stand in for
//! SQLite (see [WithStore]). The runner itself never touches a database.

mod config;
mod error;
mod runner;
mod schema;
mod sqlite;
mod task;
mod version;

pub use config::{Config, Synchronous};
pub use error::{MigrationError, SchemaError, StoreError, TaskError};
pub use runner::{Plan, Step};
pub use schema::{Field, FieldDefault, FieldType, Index, Key, KeyKind, SchemaEdit};
pub use sqlite::SqliteSchema;
pub use task::{Notifier, StatusChange, StatusChangedTask, Task};
pub use version::{MemoryVersion, SchemaVersion, VersionStore, WithStore};
