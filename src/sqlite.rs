//! SQLite implementation of the schema-mutation API and version store.

use r2d2::ManageConnection;
use rusqlite::Connection;
use sea_query::{Alias, ColumnDef, SqliteQueryBuilder};

use crate::config::Config;
use crate::error::{SchemaError, StoreError};
use crate::schema::{Field, FieldDefault, FieldType, Index, Key, KeyKind, SchemaEdit};
use crate::version::{SchemaVersion, VersionStore};

/// Exclusive handle on a SQLite database, used to run migrations.
///
/// [SqliteSchema] implements both [SchemaEdit] and [VersionStore]: the
/// current schema version lives in the `user_version` pragma of the same
/// database file, so version and schema can never go to different places.
///
/// The handle holds a single connection and assumes nothing else is writing
/// to the database while migrations run; serializing upgrade runs is the
/// caller's responsibility.
pub struct SqliteSchema {
    manager: r2d2_sqlite::SqliteConnectionManager,
    conn: Connection,
}

impl SqliteSchema {
    /// Open the database described by `config`.
    ///
    /// If the database is brand new (its `schema_version` pragma is zero),
    /// the configured init statements are executed first.
    pub fn open(config: Config) -> Result<Self, SchemaError> {
        let conn = config.manager.connect()?;
        conn.pragma_update(None, "synchronous", config.synchronous.as_str())?;
        // DDL below must not trip over half-migrated references
        conn.pragma_update(None, "foreign_keys", "OFF")?;

        if schema_version(&conn)? == 0 {
            (config.init)(&conn);
        }

        Ok(Self {
            manager: config.manager,
            conn,
        })
    }

    /// Finish migrating and turn the database into a connection pool for
    /// the application.
    pub fn finish(self) -> Result<r2d2::Pool<r2d2_sqlite::SqliteConnectionManager>, SchemaError> {
        drop(self.conn);
        Ok(r2d2::Pool::new(self.manager)?)
    }

    fn require_table(&self, table: &str) -> Result<(), SchemaError> {
        if !self.table_exists(table)? {
            return Err(SchemaError::NoSuchTable(table.to_owned()));
        }
        Ok(())
    }

    fn create_index(
        &self,
        table: &str,
        name: &str,
        columns: &[String],
        unique: bool,
    ) -> Result<(), SchemaError> {
        let mut create = sea_query::Index::create();
        create.name(name).table(Alias::new(table));
        for column in columns {
            create.col(Alias::new(column.as_str()));
        }
        if unique {
            create.unique();
        }
        self.conn.execute(&create.to_string(SqliteQueryBuilder), [])?;
        Ok(())
    }
}

impl SchemaEdit for SqliteSchema {
    fn table_exists(&self, table: &str) -> Result<bool, SchemaError> {
        let exists = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM pragma_table_list WHERE schema = 'main' AND name = ?1)",
            [table],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn field_exists(&self, table: &str, field: &str) -> Result<bool, SchemaError> {
        let exists = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2)",
            [table, field],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn index_exists(&self, table: &str, index: &str) -> Result<bool, SchemaError> {
        let exists = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM pragma_index_list(?1) WHERE name = ?2)",
            [table, index],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn add_field(&mut self, table: &str, field: &Field) -> Result<(), SchemaError> {
        self.require_table(table)?;

        let mut def = ColumnDef::new(Alias::new(field.name.as_str()));
        match field.typ {
            FieldType::Integer => def.integer(),
            FieldType::Real => def.custom(Alias::new("REAL")),
            FieldType::Text => def.text(),
            FieldType::Blob => def.blob(),
            FieldType::Any => def.custom(Alias::new("ANY")),
        };
        if field.nullable {
            def.null();
        } else {
            def.not_null();
        }
        match &field.default {
            Some(FieldDefault::Int(v)) => {
                def.default(*v);
            }
            Some(FieldDefault::Real(v)) => {
                def.default(*v);
            }
            Some(FieldDefault::Text(v)) => {
                def.default(v.as_str());
            }
            None => {}
        }

        let mut alter = sea_query::Table::alter();
        alter.table(Alias::new(table)).add_column(def);
        self.conn.execute(&alter.to_string(SqliteQueryBuilder), [])?;
        Ok(())
    }

    fn drop_field(&mut self, table: &str, field: &str) -> Result<(), SchemaError> {
        self.require_table(table)?;
        if !self.field_exists(table, field)? {
            return Err(SchemaError::NoSuchColumn {
                table: table.to_owned(),
                column: field.to_owned(),
            });
        }

        let mut alter = sea_query::Table::alter();
        alter.table(Alias::new(table)).drop_column(Alias::new(field));
        self.conn.execute(&alter.to_string(SqliteQueryBuilder), [])?;
        Ok(())
    }

    fn drop_table(&mut self, table: &str) -> Result<(), SchemaError> {
        self.require_table(table)?;
        let drop = sea_query::Table::drop().table(Alias::new(table)).take();
        self.conn.execute(&drop.to_string(SqliteQueryBuilder), [])?;
        Ok(())
    }

    /// SQLite cannot add constraints to an existing table, so keys degrade
    /// to the closest thing it can do after the fact: a unique key becomes a
    /// unique index, a foreign key becomes a plain index on the referencing
    /// columns, and a primary key is refused.
    fn add_key(&mut self, table: &str, key: &Key) -> Result<(), SchemaError> {
        self.require_table(table)?;
        match &key.kind {
            KeyKind::Primary => Err(SchemaError::Unsupported(
                "sqlite cannot add a primary key to an existing table",
            )),
            KeyKind::Unique => self.create_index(table, &key.name, &key.columns, true),
            KeyKind::Foreign { .. } => self.create_index(table, &key.name, &key.columns, false),
        }
    }

    fn add_index(&mut self, table: &str, index: &Index) -> Result<(), SchemaError> {
        self.require_table(table)?;
        self.create_index(table, &index.name, &index.columns, index.unique)
    }
}

impl VersionStore for SqliteSchema {
    fn current(&self) -> Result<SchemaVersion, StoreError> {
        user_version(&self.conn).map_err(StoreError::new)
    }

    fn set(&mut self, version: SchemaVersion) -> Result<(), StoreError> {
        set_user_version(&self.conn, version).map_err(StoreError::new)
    }
}

fn schema_version(conn: &Connection) -> Result<i64, rusqlite::Error> {
    conn.query_row("PRAGMA schema_version", [], |row| row.get(0))
}

// Read user version field from the SQLite db
fn user_version(conn: &Connection) -> Result<i64, rusqlite::Error> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

// Set user version field from the SQLite db
fn set_user_version(conn: &Connection, v: i64) -> Result<(), rusqlite::Error> {
    conn.pragma_update(None, "user_version", v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> SqliteSchema {
        let config = Config::open_in_memory().init_stmt(
            "CREATE TABLE entry (id INTEGER PRIMARY KEY, course INTEGER NOT NULL DEFAULT 0) STRICT;
             CREATE TABLE old_notes (id INTEGER PRIMARY KEY) STRICT;",
        );
        SqliteSchema::open(config).unwrap()
    }

    #[test]
    fn init_statements_create_the_baseline() {
        let db = test_db();
        assert!(db.table_exists("entry").unwrap());
        assert!(db.table_exists("old_notes").unwrap());
        assert!(!db.table_exists("submission").unwrap());
        assert!(db.field_exists("entry", "course").unwrap());
        assert!(!db.field_exists("entry", "approved").unwrap());
    }

    #[test]
    fn add_and_drop_field() {
        let mut db = test_db();
        let field = Field::new("approved", FieldType::Integer)
            .not_null()
            .default_to(0);
        db.add_field("entry", &field).unwrap();
        assert!(db.field_exists("entry", "approved").unwrap());

        // the column is real: inserts pick up the default
        db.conn
            .execute("INSERT INTO entry (course) VALUES (7)", [])
            .unwrap();
        let approved: i64 = db
            .conn
            .query_row("SELECT approved FROM entry", [], |row| row.get(0))
            .unwrap();
        assert_eq!(approved, 0);

        db.drop_field("entry", "approved").unwrap();
        assert!(!db.field_exists("entry", "approved").unwrap());
        assert!(matches!(
            db.drop_field("entry", "approved"),
            Err(SchemaError::NoSuchColumn { .. })
        ));
    }

    #[test]
    fn add_text_field_with_default() {
        let mut db = test_db();
        let field = Field::new("grade", FieldType::Text)
            .not_null()
            .default_to("none");
        db.add_field("entry", &field).unwrap();

        db.conn
            .execute("INSERT INTO entry (course) VALUES (1)", [])
            .unwrap();
        let grade: String = db
            .conn
            .query_row("SELECT grade FROM entry", [], |row| row.get(0))
            .unwrap();
        assert_eq!(grade, "none");
    }

    #[test]
    fn drop_table_is_not_guarded() {
        let mut db = test_db();
        db.drop_table("old_notes").unwrap();
        assert!(!db.table_exists("old_notes").unwrap());
        assert!(matches!(
            db.drop_table("old_notes"),
            Err(SchemaError::NoSuchTable(_))
        ));
    }

    #[test]
    fn indexes_and_keys() {
        let mut db = test_db();
        db.add_index("entry", &Index::new("entry_course_ix", ["course"]))
            .unwrap();
        assert!(db.index_exists("entry", "entry_course_ix").unwrap());
        assert!(!db.index_exists("entry", "entry_other_ix").unwrap());

        db.add_key("entry", &Key::unique("entry_course_uk", ["course"]))
            .unwrap();
        assert!(db.index_exists("entry", "entry_course_uk").unwrap());

        // the unique key is enforced
        db.conn
            .execute("INSERT INTO entry (course) VALUES (1)", [])
            .unwrap();
        assert!(db
            .conn
            .execute("INSERT INTO entry (course) VALUES (1)", [])
            .is_err());

        assert!(matches!(
            db.add_key("entry", &Key::primary("entry_pk", ["course"])),
            Err(SchemaError::Unsupported(_))
        ));
    }

    #[test]
    fn foreign_key_becomes_a_plain_index() {
        let mut db = test_db();
        let key = Key::foreign("entry_course_fk", ["course"], "course", ["id"]);
        db.add_key("entry", &key).unwrap();
        assert!(db.index_exists("entry", "entry_course_fk").unwrap());
    }

    #[test]
    fn user_version_round_trips() {
        let mut db = test_db();
        assert_eq!(db.current().unwrap(), 0);
        db.set(2025120101).unwrap();
        assert_eq!(db.current().unwrap(), 2025120101);
    }

    #[test]
    fn mutations_on_missing_tables_are_errors() {
        let mut db = test_db();
        let field = Field::new("x", FieldType::Integer);
        assert!(matches!(
            db.add_field("submission", &field),
            Err(SchemaError::NoSuchTable(_))
        ));
        assert!(matches!(
            db.add_index("submission", &Index::new("ix", ["x"])),
            Err(SchemaError::NoSuchTable(_))
        ));
    }
}
