//! The store facade: the only place that talks to the SQLite connection.
//!
//! [`Store`] wraps a `rusqlite::Connection` and offers three layers:
//!
//! - raw SQL with `?` placeholders ([`raw_query`](Store::raw_query),
//!   [`raw_execute`](Store::raw_execute), [`query_all`](Store::query_all))
//! - record-level operations keyed by `_id` ([`find_by_id`](Store::find_by_id),
//!   [`insert_record`](Store::insert_record), [`upsert`](Store::upsert), ...)
//! - statement builders ([`select`](Store::select), [`update`](Store::update),
//!   [`delete`](Store::delete), [`insert`](Store::insert))
//!
//! # Example
//!
//! ```
//! use lightrow_core::{ID_COLUMN, Record, RecordDef, field};
//! use lightrow_sqlite::Store;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Person { id: Option<i64>, name: String, age: i32 }
//!
//! impl Record for Person {
//!     fn define() -> RecordDef<Self> {
//!         RecordDef::new()
//!             .field(field!(Person, id).column(ID_COLUMN))
//!             .field(field!(Person, name))
//!             .field(field!(Person, age))
//!     }
//!     fn blank() -> Self { Self::default() }
//! }
//!
//! let store = Store::open_in_memory().unwrap();
//! store.create_table::<Person>().unwrap();
//!
//! let mut alice = Person { id: None, name: "Alice".into(), age: 30 };
//! let id = store.insert_record(&mut alice).unwrap();
//! assert_eq!(alice.id, id);
//!
//! let found: Person = store.find_by_id(id).unwrap().unwrap();
//! assert_eq!(found, alice);
//! ```

use std::path::Path;

use lightrow_core::{
    Conditional, ForeignKey, ID_COLUMN, Record, Row, Value, bind_params, from_source, hydrate,
    schema_for, to_row,
};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::cursor::SqliteRow;
use crate::error::Result;
use crate::schema::{create_batch, drop_table_sql};
use crate::statement::{Delete, Insert, Select, Update};

/// A handle to one SQLite database.
///
/// The connection is used from one thread at a time; open one store per
/// thread when several are needed.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Wraps an already opened connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens (or creates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Connection::open(path)?))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Connection::open_in_memory()?))
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Consumes the store and returns the underlying connection.
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    /// Runs a query and returns every row.
    ///
    /// Each `?` in `sql` is replaced by the next parameter rendered as a
    /// quoted literal; see [`bind_params`]. Placeholders left over once the
    /// parameters run out stay in the text and read as NULL.
    ///
    /// # Examples
    ///
    /// ```
    /// use lightrow_core::Value;
    /// use lightrow_sqlite::Store;
    ///
    /// let store = Store::open_in_memory().unwrap();
    /// let rows = store.raw_query("SELECT ? AS greeting", &[Value::from("it's me")]).unwrap();
    /// assert_eq!(rows[0].get("greeting"), Some(&Value::from("it's me")));
    /// ```
    pub fn raw_query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.query_map(&bind_params(sql, params), |row| Ok(row.to_row()?))
    }

    /// Runs a statement and returns the number of changed rows.
    pub fn raw_execute(&self, sql: &str, params: &[Value]) -> Result<usize> {
        self.execute_sql(&bind_params(sql, params))
    }

    /// Runs a query and builds one record per row.
    pub fn query_all<R: Record>(&self, sql: &str, params: &[Value]) -> Result<Vec<R>> {
        self.query_map(&bind_params(sql, params), |row| Ok(from_source::<R>(row)?))
    }

    /// Runs a query and builds a record from its first row.
    pub fn query_one<R: Record>(&self, sql: &str, params: &[Value]) -> Result<Option<R>> {
        self.query_first(&bind_params(sql, params), |row| Ok(from_source::<R>(row)?))
    }

    /// Looks a record up by its identifier.
    ///
    /// Returns `None` when `id` is `None` or no row matches.
    pub fn find_by_id<R: Record>(&self, id: Option<i64>) -> Result<Option<R>> {
        let schema = schema_for::<R>()?;
        let column = schema.identifier()?;
        let Some(id) = id else {
            return Ok(None);
        };
        self.select::<R>()?.where_equals(column, [id]).one()
    }

    /// Inserts a record and stores the new identifier on it.
    ///
    /// Returns `None` if the database rejected the row; the failure is
    /// logged and the record is left unchanged.
    pub fn insert_record<R: Record>(&self, record: &mut R) -> Result<Option<i64>> {
        let schema = schema_for::<R>()?;
        let row = to_row(record)?;
        let Some(id) = self.insert::<R>()?.values(row).execute() else {
            return Ok(None);
        };
        if schema.has_identifier() {
            schema.set_id(record, Some(id))?;
        }
        Ok(Some(id))
    }

    /// Writes every field of a stored record back to its row.
    ///
    /// Returns `false` when the record has no identifier yet or no row has
    /// that identifier.
    pub fn update_record<R: Record>(&self, record: &R) -> Result<bool> {
        let schema = schema_for::<R>()?;
        let Some(id) = schema.id_of(record)? else {
            return Ok(false);
        };
        let affected = self
            .update::<R>()?
            .set_row(to_row(record)?)
            .where_equals(ID_COLUMN, [id])
            .update_all()?;
        Ok(affected > 0)
    }

    /// Updates the record's row if it exists, inserts it otherwise.
    ///
    /// Returns the record's identifier, or `None` if the insert failed.
    pub fn upsert<R: Record>(&self, record: &mut R) -> Result<Option<i64>> {
        if self.update_record(record)? {
            return schema_for::<R>()?.id_of(record).map_err(Into::into);
        }
        self.insert_record(record)
    }

    /// Deletes the row with identifier `id`.
    ///
    /// Returns `true` only if exactly one row was removed.
    pub fn delete_by_id<R: Record>(&self, id: Option<i64>) -> Result<bool> {
        let schema = schema_for::<R>()?;
        let column = schema.identifier()?;
        let Some(id) = id else {
            return Ok(false);
        };
        let removed = self
            .delete::<R>()?
            .where_equals(column, [id])
            .perform_delete()?;
        Ok(removed == 1)
    }

    /// Reloads every field of `record` from its stored row.
    ///
    /// Returns `false` when the record has no identifier or its row is gone.
    pub fn refresh<R: Record>(&self, record: &mut R) -> Result<bool> {
        let schema = schema_for::<R>()?;
        let Some(id) = schema.id_of(record)? else {
            return Ok(false);
        };
        let sql = self.select::<R>()?.where_equals(ID_COLUMN, [id]).to_sql();
        let found = self.query_first(&sql, |row| Ok(hydrate(&mut *record, row)?))?;
        Ok(found.is_some())
    }

    /// Fetches the record a foreign key points at.
    ///
    /// Every call is a fresh lookup.
    pub fn resolve<P: Record>(&self, key: &ForeignKey<P>) -> Result<Option<P>> {
        self.find_by_id(key.id())
    }

    /// Creates the record's table and its indexes if they do not exist.
    pub fn create_table<R: Record>(&self) -> Result<()> {
        let schema = schema_for::<R>()?;
        let batch = create_batch(&schema);
        debug!(sql = %batch, "creating table");
        self.conn.execute_batch(&batch)?;
        info!(table = %schema.table(), "table ready");
        Ok(())
    }

    /// Drops the record's table if it exists.
    pub fn drop_table<R: Record>(&self) -> Result<()> {
        let schema = schema_for::<R>()?;
        self.conn.execute_batch(&drop_table_sql(&schema))?;
        info!(table = %schema.table(), "table dropped");
        Ok(())
    }

    /// Returns `true` if a table named `name` exists.
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Starts a SELECT of whole records.
    pub fn select<R: Record>(&self) -> Result<Select<'_, R>> {
        Ok(Select::new(self, schema_for::<R>()?, Vec::new()))
    }

    /// Starts a SELECT of specific columns.
    ///
    /// The projection applies to [`Select::rows`] and [`Select::to_sql`];
    /// record reads always select every column.
    pub fn select_columns<R, I, S>(&self, columns: I) -> Result<Select<'_, R>>
    where
        R: Record,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        Ok(Select::new(self, schema_for::<R>()?, columns))
    }

    /// Starts an UPDATE.
    pub fn update<R: Record>(&self) -> Result<Update<'_, R>> {
        Ok(Update::new(self, schema_for::<R>()?))
    }

    /// Starts a DELETE.
    pub fn delete<R: Record>(&self) -> Result<Delete<'_, R>> {
        Ok(Delete::new(self, schema_for::<R>()?))
    }

    /// Starts an INSERT.
    pub fn insert<R: Record>(&self) -> Result<Insert<'_, R>> {
        Ok(Insert::new(self, schema_for::<R>()?))
    }

    // The helpers below run statements without binding anything, so a `?`
    // left over by `bind_params` reads as NULL instead of failing the
    // parameter count check.
    pub(crate) fn execute_sql(&self, sql: &str) -> Result<usize> {
        debug!(sql, "execute");
        Ok(self.conn.prepare(sql)?.raw_execute()?)
    }

    pub(crate) fn query_scalar(&self, sql: &str) -> Result<i64> {
        debug!(sql, "query");
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.raw_query();
        match rows.next()? {
            Some(row) => Ok(row.get(0)?),
            None => Err(rusqlite::Error::QueryReturnedNoRows.into()),
        }
    }

    pub(crate) fn query_map<T, F>(&self, sql: &str, mut map: F) -> Result<Vec<T>>
    where
        F: FnMut(&SqliteRow<'_, '_>) -> Result<T>,
    {
        debug!(sql, "query");
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.raw_query();
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(map(&SqliteRow::new(row))?);
        }
        Ok(out)
    }

    pub(crate) fn query_first<T, F>(&self, sql: &str, map: F) -> Result<Option<T>>
    where
        F: FnOnce(&SqliteRow<'_, '_>) -> Result<T>,
    {
        debug!(sql, "query");
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.raw_query();
        match rows.next()? {
            Some(row) => map(&SqliteRow::new(row)).map(Some),
            None => Ok(None),
        }
    }
}

/// Record-level persistence shortcuts.
///
/// Implemented for every [`Record`], so `person.save(&store)` works as soon
/// as the trait is in scope.
pub trait Persist: Record {
    /// Inserts or updates the record; see [`Store::upsert`].
    fn save(&mut self, store: &Store) -> Result<Option<i64>> {
        store.upsert(self)
    }

    /// Reloads the record from its row; see [`Store::refresh`].
    fn reload(&mut self, store: &Store) -> Result<bool> {
        store.refresh(self)
    }

    /// Deletes the record's row; see [`Store::delete_by_id`].
    fn remove(&self, store: &Store) -> Result<bool> {
        let id = schema_for::<Self>()?.id_of(self)?;
        store.delete_by_id::<Self>(id)
    }
}

impl<R: Record> Persist for R {}

#[cfg(test)]
mod tests {
    use super::*;
    use lightrow_core::{MappingError, RecordDef, field};

    use crate::error::StoreError;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Counter {
        id: Option<i64>,
        label: String,
        hits: i64,
    }

    impl Record for Counter {
        fn define() -> RecordDef<Self> {
            RecordDef::new()
                .field(field!(Counter, id).column(ID_COLUMN))
                .field(field!(Counter, label).index())
                .field(field!(Counter, hits))
        }

        fn blank() -> Self {
            Self::default()
        }
    }

    #[derive(Debug, Default)]
    struct Loose {
        text: String,
    }

    impl Record for Loose {
        fn define() -> RecordDef<Self> {
            RecordDef::new().field(field!(Loose, text))
        }

        fn blank() -> Self {
            Self::default()
        }
    }

    fn store() -> Store {
        let store = Store::open_in_memory().unwrap();
        store.create_table::<Counter>().unwrap();
        store
    }

    #[test]
    fn test_create_and_drop_table() {
        let store = store();
        assert!(store.table_exists("Counter").unwrap());
        store.create_table::<Counter>().unwrap();
        store.drop_table::<Counter>().unwrap();
        assert!(!store.table_exists("Counter").unwrap());
        store.drop_table::<Counter>().unwrap();
    }

    #[test]
    fn test_raw_execute_binds_params() {
        let store = store();
        let changed = store
            .raw_execute(
                "INSERT INTO Counter(label, hits) VALUES (?, ?)",
                &[Value::from("it's"), Value::from(3)],
            )
            .unwrap();
        assert_eq!(changed, 1);

        let rows = store
            .raw_query("SELECT label FROM Counter WHERE hits = ?", &[Value::from(3)])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("label"), Some(&Value::from("it's")));
    }

    #[test]
    fn test_raw_query_unbound_placeholders_read_as_null() {
        let store = store();
        let rows = store
            .raw_query("SELECT ? AS a, ? AS b", &[Value::from(1)])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].to_string(), "{a=1, b=NULL}");

        let changed = store
            .raw_execute("INSERT INTO Counter(label, hits) VALUES (?, ?)", &[Value::from("z")])
            .unwrap();
        assert_eq!(changed, 1);
        let rows = store
            .raw_query("SELECT hits FROM Counter WHERE label = ?", &[Value::from("z")])
            .unwrap();
        assert_eq!(rows[0].get("hits"), Some(&Value::Null));
    }

    #[test]
    fn test_query_all_and_one() {
        let store = store();
        for label in ["a", "b"] {
            let mut counter = Counter {
                label: label.into(),
                ..Counter::default()
            };
            store.insert_record(&mut counter).unwrap();
        }
        let all: Vec<Counter> = store
            .query_all("SELECT * FROM Counter ORDER BY label", &[])
            .unwrap();
        assert_eq!(all.len(), 2);
        let one: Option<Counter> = store
            .query_one("SELECT * FROM Counter WHERE label = ?", &[Value::from("b")])
            .unwrap();
        assert_eq!(one.unwrap().label, "b");
    }

    #[test]
    fn test_find_by_id_none() {
        let store = store();
        assert_eq!(store.find_by_id::<Counter>(None).unwrap(), None);
        assert_eq!(store.find_by_id::<Counter>(Some(42)).unwrap(), None);
    }

    #[test]
    fn test_find_by_id_requires_identifier() {
        let store = Store::open_in_memory().unwrap();
        let err = store.find_by_id::<Loose>(Some(1)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Mapping(MappingError::MissingIdentifier { .. })
        ));
    }

    #[test]
    fn test_update_record_without_id() {
        let store = store();
        assert!(!store.update_record(&Counter::default()).unwrap());
    }

    #[test]
    fn test_upsert_inserts_then_updates() {
        let store = store();
        let mut counter = Counter {
            label: "x".into(),
            ..Counter::default()
        };

        let id = store.upsert(&mut counter).unwrap();
        assert!(id.is_some());
        assert_eq!(counter.id, id);

        counter.hits = 5;
        assert_eq!(store.upsert(&mut counter).unwrap(), id);
        assert_eq!(counter.id, id);

        let stored = store.find_by_id::<Counter>(id).unwrap().unwrap();
        assert_eq!(stored.hits, 5);
        assert_eq!(store.select::<Counter>().unwrap().count().unwrap(), 1);
    }

    #[test]
    fn test_delete_by_id() {
        let store = store();
        let mut counter = Counter::default();
        let id = store.insert_record(&mut counter).unwrap();
        assert!(!store.delete_by_id::<Counter>(None).unwrap());
        assert!(store.delete_by_id::<Counter>(id).unwrap());
        assert!(!store.delete_by_id::<Counter>(id).unwrap());
    }

    #[test]
    fn test_refresh() {
        let store = store();
        let mut counter = Counter {
            label: "r".into(),
            ..Counter::default()
        };
        store.insert_record(&mut counter).unwrap();
        store
            .update::<Counter>()
            .unwrap()
            .set("hits", 7)
            .update_all()
            .unwrap();

        assert!(store.refresh(&mut counter).unwrap());
        assert_eq!(counter.hits, 7);

        store.delete_by_id::<Counter>(counter.id).unwrap();
        assert!(!store.refresh(&mut counter).unwrap());
        assert!(!store.refresh(&mut Counter::default()).unwrap());
    }

    #[test]
    fn test_persist_trait() {
        let store = store();
        let mut counter = Counter {
            label: "p".into(),
            ..Counter::default()
        };
        let id = counter.save(&store).unwrap();
        assert!(id.is_some());

        counter.hits = 2;
        counter.save(&store).unwrap();
        counter.hits = 0;
        assert!(counter.reload(&store).unwrap());
        assert_eq!(counter.hits, 2);

        assert!(counter.remove(&store).unwrap());
        assert_eq!(store.find_by_id::<Counter>(id).unwrap(), None);
    }

    #[test]
    fn test_insert_record_into_missing_table() {
        let store = Store::open_in_memory().unwrap();
        let mut counter = Counter::default();
        assert_eq!(store.insert_record(&mut counter).unwrap(), None);
        assert_eq!(counter.id, None);
    }
}
