//! Opening a store at a configured version.
//!
//! The schema version an application expects lives in its
//! [`StoreConfig`]; the version a database was last opened with is kept in
//! SQLite's `PRAGMA user_version`. [`Bootstrap::open`] compares the two:
//!
//! - stored version `0` (a new database): every table is created
//! - same version: nothing is touched
//! - any other version: every table is dropped and created again
//!
//! The version change path is destructive. There is no column-level
//! migration: all rows of the configured tables are discarded.
//!
//! Each path runs in a single transaction together with the version update,
//! so a failure leaves the database as it was.
//!
//! # Example
//!
//! ```
//! use lightrow_core::{ID_COLUMN, Record, RecordDef, field};
//! use lightrow_sqlite::{Bootstrap, OpenAction, StoreConfig, TableSet};
//!
//! #[derive(Default)]
//! struct Person { id: Option<i64>, name: String }
//!
//! impl Record for Person {
//!     fn define() -> RecordDef<Self> {
//!         RecordDef::new()
//!             .field(field!(Person, id).column(ID_COLUMN))
//!             .field(field!(Person, name))
//!     }
//!     fn blank() -> Self { Self::default() }
//! }
//!
//! let tables = TableSet::new().with::<Person>().unwrap();
//! let (store, report) = Bootstrap::open(&StoreConfig::in_memory(1), &tables).unwrap();
//! assert_eq!(report.action, OpenAction::Created);
//! assert!(store.table_exists("Person").unwrap());
//! ```

use rusqlite::{Connection, OpenFlags};
use tracing::{info, warn};

use lightrow_core::{Record, schema_for};

use crate::config::StoreConfig;
use crate::error::Result;
use crate::schema::{create_batch, drop_table_sql};
use crate::store::Store;

#[derive(Debug, Clone)]
struct TableDef {
    table: String,
    create: String,
    drop: String,
}

/// The record tables an application stores, in creation order.
///
/// Building the set derives each record's schema, so configuration errors
/// show up here rather than when the store is opened.
#[derive(Debug, Clone, Default)]
pub struct TableSet {
    tables: Vec<TableDef>,
}

impl TableSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the table of record type `R`. Adding the same table twice has
    /// no effect.
    pub fn with<R: Record>(mut self) -> Result<Self> {
        let schema = schema_for::<R>()?;
        if !self.tables.iter().any(|t| t.table == schema.table()) {
            self.tables.push(TableDef {
                table: schema.table().to_string(),
                create: create_batch(&schema),
                drop: drop_table_sql(&schema),
            });
        }
        Ok(self)
    }

    /// Table names in creation order.
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.table.as_str())
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns `true` if no table was added.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// What [`Bootstrap::open`] did to the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAction {
    /// The database was new; every table was created.
    Created,
    /// The stored version matched; nothing changed.
    Opened,
    /// The stored version differed; every table was dropped and recreated.
    Upgraded {
        /// Version found in the database.
        from: u32,
        /// Version from the configuration.
        to: u32,
    },
}

/// Outcome of [`Bootstrap::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenReport {
    /// What was done.
    pub action: OpenAction,
    /// Version the database now carries.
    pub version: u32,
    /// Tables of the set, in creation order.
    pub tables: Vec<String>,
}

/// Table lifecycle operations over a [`TableSet`].
pub struct Bootstrap;

impl Bootstrap {
    /// Opens the configured database and brings its tables to the
    /// configured version.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`](crate::StoreError::InvalidConfig)
    /// for an unusable configuration, or
    /// [`StoreError::Database`](crate::StoreError::Database) if the file
    /// cannot be opened or a DDL statement fails.
    pub fn open(config: &StoreConfig, tables: &TableSet) -> Result<(Store, OpenReport)> {
        config.validate()?;
        let store = Store::new(connect(config)?);
        let stored = Self::version(&store)?;
        let target = config.version;

        let action = if stored == 0 {
            info!(path = %config.path.display(), version = target, "creating store");
            Self::run(&store, tables, false, target)?;
            OpenAction::Created
        } else if stored == target {
            info!(path = %config.path.display(), version = target, "opened store");
            OpenAction::Opened
        } else {
            warn!(
                path = %config.path.display(),
                from = stored,
                to = target,
                "store version changed, dropping and recreating all tables"
            );
            Self::run(&store, tables, true, target)?;
            OpenAction::Upgraded {
                from: stored,
                to: target,
            }
        };

        let report = OpenReport {
            action,
            version: target,
            tables: tables.tables().map(String::from).collect(),
        };
        Ok((store, report))
    }

    /// Creates every table of the set that does not exist yet.
    pub fn create_all(store: &Store, tables: &TableSet) -> Result<()> {
        let tx = store.connection().unchecked_transaction()?;
        create_tables(&tx, tables)?;
        tx.commit()?;
        Ok(())
    }

    /// Drops every table of the set.
    pub fn drop_all(store: &Store, tables: &TableSet) -> Result<()> {
        let tx = store.connection().unchecked_transaction()?;
        drop_tables(&tx, tables)?;
        tx.commit()?;
        Ok(())
    }

    /// Drops and creates every table of the set, discarding their rows.
    pub fn recreate_all(store: &Store, tables: &TableSet) -> Result<()> {
        let tx = store.connection().unchecked_transaction()?;
        drop_tables(&tx, tables)?;
        create_tables(&tx, tables)?;
        tx.commit()?;
        Ok(())
    }

    /// Reads the version stored in the database; `0` for a new database.
    pub fn version(store: &Store) -> Result<u32> {
        let version: i64 = store
            .connection()
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;
        Ok(u32::try_from(version).unwrap_or_default())
    }

    fn run(store: &Store, tables: &TableSet, drop_first: bool, version: u32) -> Result<()> {
        let tx = store.connection().unchecked_transaction()?;
        if drop_first {
            drop_tables(&tx, tables)?;
        }
        create_tables(&tx, tables)?;
        tx.execute_batch(&format!("PRAGMA user_version = {version}"))?;
        tx.commit()?;
        Ok(())
    }
}

fn connect(config: &StoreConfig) -> Result<Connection> {
    if config.is_in_memory() {
        return Ok(Connection::open_in_memory()?);
    }
    let conn = if config.create_if_missing {
        Connection::open(&config.path)?
    } else {
        Connection::open_with_flags(
            &config.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?
    };
    Ok(conn)
}

fn create_tables(conn: &Connection, tables: &TableSet) -> Result<()> {
    for def in &tables.tables {
        conn.execute_batch(&def.create)?;
        info!(table = %def.table, "created table");
    }
    Ok(())
}

fn drop_tables(conn: &Connection, tables: &TableSet) -> Result<()> {
    for def in tables.tables.iter().rev() {
        conn.execute_batch(&def.drop)?;
        info!(table = %def.table, "dropped table");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightrow_core::{ID_COLUMN, MappingError, RecordDef, field};

    use crate::error::StoreError;

    #[derive(Default)]
    struct Book {
        id: Option<i64>,
        title: String,
    }

    impl Record for Book {
        fn define() -> RecordDef<Self> {
            RecordDef::new()
                .field(field!(Book, id).column(ID_COLUMN))
                .field(field!(Book, title).index())
        }

        fn blank() -> Self {
            Self::default()
        }
    }

    #[derive(Default)]
    struct Shelf {
        id: Option<i64>,
        label: String,
    }

    impl Record for Shelf {
        fn define() -> RecordDef<Self> {
            RecordDef::new()
                .field(field!(Shelf, id).column(ID_COLUMN))
                .field(field!(Shelf, label))
        }

        fn blank() -> Self {
            Self::default()
        }
    }

    struct Invalid;

    impl Record for Invalid {
        fn define() -> RecordDef<Self> {
            RecordDef::new().table("no spaces")
        }

        fn blank() -> Self {
            Invalid
        }
    }

    fn tables() -> TableSet {
        TableSet::new().with::<Book>().unwrap().with::<Shelf>().unwrap()
    }

    #[test]
    fn test_table_set_deduplicates() {
        let set = tables().with::<Book>().unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.tables().collect::<Vec<_>>(), ["Book", "Shelf"]);
        assert!(TableSet::new().is_empty());
    }

    #[test]
    fn test_table_set_reports_schema_errors() {
        let err = TableSet::new().with::<Invalid>().unwrap_err();
        assert!(matches!(
            err,
            StoreError::Mapping(MappingError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_open_creates_tables_and_sets_version() {
        let (store, report) = Bootstrap::open(&StoreConfig::in_memory(2), &tables()).unwrap();
        assert_eq!(report.action, OpenAction::Created);
        assert_eq!(report.version, 2);
        assert_eq!(report.tables, ["Book", "Shelf"]);
        assert!(store.table_exists("Book").unwrap());
        assert!(store.table_exists("Shelf").unwrap());
        assert_eq!(Bootstrap::version(&store).unwrap(), 2);
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let err = Bootstrap::open(&StoreConfig::in_memory(0), &tables()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidConfig(_)));
    }

    #[test]
    fn test_drop_all_and_create_all() {
        let (store, _) = Bootstrap::open(&StoreConfig::in_memory(1), &tables()).unwrap();
        Bootstrap::drop_all(&store, &tables()).unwrap();
        assert!(!store.table_exists("Book").unwrap());
        Bootstrap::create_all(&store, &tables()).unwrap();
        Bootstrap::create_all(&store, &tables()).unwrap();
        assert!(store.table_exists("Book").unwrap());
    }

    #[test]
    fn test_recreate_all_discards_rows() {
        let (store, _) = Bootstrap::open(&StoreConfig::in_memory(1), &tables()).unwrap();
        let mut dune = Book {
            id: None,
            title: "Dune".into(),
        };
        store.insert_record(&mut dune).unwrap();
        assert_eq!(store.select::<Book>().unwrap().count().unwrap(), 1);

        Bootstrap::recreate_all(&store, &tables()).unwrap();
        assert_eq!(store.select::<Book>().unwrap().count().unwrap(), 0);
    }

    #[test]
    fn test_open_missing_file_without_create() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StoreConfig::new(dir.path().join("absent.db"), 1);
        config.create_if_missing = false;
        let err = Bootstrap::open(&config, &tables()).unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
    }
}
