use std::path::Path;

use rusqlite::config::DbConfig;

#[cfg(doc)]
use crate::sqlite::SqliteSchema;

/// [Config] is used to open a database from a file or in memory.
///
/// This is the first step in the [Config] -> [SqliteSchema] -> [r2d2::Pool]
/// chain: open the database, run the migration plan against it, then hand
/// the pooled connections to the application.
pub struct Config {
    pub(crate) manager: r2d2_sqlite::SqliteConnectionManager,
    pub(crate) init: Box<dyn FnOnce(&rusqlite::Connection)>,
    /// Configure how often SQLite will synchronize the database to disk.
    ///
    /// The default is [Synchronous::Full].
    pub synchronous: Synchronous,
}

/// <https://www.sqlite.org/pragma.html#pragma_synchronous>
///
/// Note that the database uses WAL mode, so make sure to read the WAL
/// specific section.
#[non_exhaustive]
pub enum Synchronous {
    /// SQLite will fsync after every transaction.
    ///
    /// Transactions are durable, even following a power failure or hard reboot.
    Full,

    /// SQLite will only do essential fsync to prevent corruption.
    ///
    /// The database will not rollback transactions due to application crashes,
    /// but it might rollback due to a hardware reset or power loss.
    /// Use this when performance is more important than durability.
    Normal,
}

impl Synchronous {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Synchronous::Full => "FULL",
            Synchronous::Normal => "NORMAL",
        }
    }
}

impl Config {
    /// Open a database that is stored in a file.
    /// Creates the database if it does not exist.
    ///
    /// All locking is done by SQLite, so the file can be shared with other
    /// clients, but migrations themselves require exclusive access (see
    /// [SqliteSchema]).
    pub fn open(p: impl AsRef<Path>) -> Self {
        let manager = r2d2_sqlite::SqliteConnectionManager::file(p);
        Self::open_internal(manager)
    }

    /// Creates a new empty database in memory.
    pub fn open_in_memory() -> Self {
        let manager = r2d2_sqlite::SqliteConnectionManager::memory();
        Self::open_internal(manager)
    }

    fn open_internal(manager: r2d2_sqlite::SqliteConnectionManager) -> Self {
        let manager = manager.with_init(|inner| {
            inner.pragma_update(None, "journal_mode", "WAL")?;
            inner.set_db_config(DbConfig::SQLITE_DBCONFIG_DQS_DDL, false)?;
            inner.set_db_config(DbConfig::SQLITE_DBCONFIG_DQS_DML, false)?;
            inner.set_db_config(DbConfig::SQLITE_DBCONFIG_DEFENSIVE, true)?;
            Ok(())
        });

        Self {
            manager,
            init: Box::new(|_| {}),
            synchronous: Synchronous::Full,
        }
    }

    /// Append a raw sql statement to be executed if the database was just
    /// created.
    ///
    /// The statement is executed after creating the empty database and
    /// executing all previous statements. This is the place to create the
    /// baseline tables that the migration plan then builds on.
    pub fn init_stmt(mut self, sql: &'static str) -> Self {
        self.init = Box::new(move |conn| {
            (self.init)(conn);

            conn.execute_batch(sql)
                .expect("raw sql statement to populate db failed");
        });
        self
    }
}
