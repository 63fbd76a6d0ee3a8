//! Fluent statement builders bound to a [`Store`].
//!
//! Each builder is created from a store (`store.select::<R>()` and friends),
//! accumulates clauses through consuming method calls, and either renders
//! its SQL with `to_sql` or runs it. Rendering never mutates the builder,
//! so `to_sql` can be called any number of times.
//!
//! WHERE clauses come from the [`Conditional`] trait, which must be in scope:
//!
//! ```
//! use lightrow_core::{Conditional, ID_COLUMN, Record, RecordDef, field};
//! use lightrow_sqlite::Store;
//!
//! #[derive(Default)]
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
//! let select = store
//!     .select::<Person>()
//!     .unwrap()
//!     .where_greater_than("age", 18)
//!     .order_by(["name"])
//!     .limit(10);
//! assert_eq!(
//!     select.to_sql(),
//!     "SELECT * FROM Person WHERE age > 18 ORDER BY name LIMIT 10"
//! );
//! ```

use std::sync::Arc;

use lightrow_core::{
    Conditional, FieldValue, Filter, ID_COLUMN, MappingError, Record, Row, Schema, Value,
    Window, from_source, render_assignments, render_order, render_values,
};
use tracing::warn;

use crate::error::{Result, StoreError};
use crate::store::Store;

/// A SELECT over one record table.
pub struct Select<'s, R: Record> {
    store: &'s Store,
    schema: Arc<Schema<R>>,
    columns: Vec<String>,
    filter: Filter,
    order: Vec<String>,
    window: Window,
}

impl<'s, R: Record> Select<'s, R> {
    pub(crate) fn new(store: &'s Store, schema: Arc<Schema<R>>, columns: Vec<String>) -> Self {
        Self {
            store,
            schema,
            columns,
            filter: Filter::new(),
            order: Vec::new(),
            window: Window::default(),
        }
    }

    /// Appends ORDER BY terms, e.g. `"age DESC"`.
    pub fn order_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Caps the number of rows returned.
    pub fn limit(mut self, limit: u64) -> Self {
        self.window.limit = Some(limit);
        self
    }

    /// Skips the first `offset` rows.
    pub fn offset(mut self, offset: u64) -> Self {
        self.window.offset = Some(offset);
        self
    }

    /// Renders the statement with the requested projection.
    pub fn to_sql(&self) -> String {
        let projection = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        };
        self.render(&projection)
    }

    fn render(&self, projection: &str) -> String {
        format!(
            "SELECT {projection} FROM {}{}{}{}",
            self.schema.table(),
            self.filter.render(),
            render_order(&self.order),
            self.window.render()
        )
    }

    /// Renders the statement used to materialize whole records.
    ///
    /// A narrowed projection cannot rebuild a record, so it is replaced by
    /// `*` with a warning.
    fn record_sql(&self) -> String {
        if !self.columns.is_empty() {
            warn!(
                table = %self.schema.table(),
                columns = ?self.columns,
                "'*' will be used for the SELECT so records can be rebuilt"
            );
        }
        self.render("*")
    }

    /// Counts the matching rows without materializing them.
    pub fn count(&self) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM ({})", self.to_sql());
        let count: i64 = self.store.query_scalar(&sql)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Returns the first matching record.
    pub fn one(&self) -> Result<Option<R>> {
        self.store.query_first(&self.record_sql(), |row| Ok(from_source::<R>(row)?))
    }

    /// Returns every matching record.
    pub fn all(&self) -> Result<Vec<R>> {
        self.store.query_map(&self.record_sql(), |row| Ok(from_source::<R>(row)?))
    }

    /// Returns the matching rows as generic [`Row`]s, honoring the
    /// projection.
    pub fn rows(&self) -> Result<Vec<Row>> {
        self.store.query_map(&self.to_sql(), |row| Ok(row.to_row()?))
    }
}

impl<R: Record> Conditional for Select<'_, R> {
    fn filter_mut(&mut self) -> &mut Filter {
        &mut self.filter
    }
}

/// An UPDATE over one record table.
pub struct Update<'s, R: Record> {
    store: &'s Store,
    schema: Arc<Schema<R>>,
    assignments: Row,
    filter: Filter,
}

impl<'s, R: Record> Update<'s, R> {
    pub(crate) fn new(store: &'s Store, schema: Arc<Schema<R>>) -> Self {
        Self {
            store,
            schema,
            assignments: Row::new(),
            filter: Filter::new(),
        }
    }

    /// Assigns `value` to `column`, replacing an earlier assignment.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments.insert(column, value);
        self
    }

    /// Assigns every column of `row`.
    pub fn set_row(mut self, row: Row) -> Self {
        for (column, value) in row {
            self.assignments.insert(column, value);
        }
        self
    }

    /// Drops a pending assignment.
    pub fn unset(mut self, column: &str) -> Self {
        self.assignments.remove(column);
        self
    }

    /// Renders the statement.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyAssignment`] when no column is set.
    pub fn to_sql(&self) -> Result<String> {
        if self.assignments.is_empty() {
            return Err(StoreError::EmptyAssignment(self.schema.table().to_string()));
        }
        Ok(format!(
            "UPDATE {} SET {}{}",
            self.schema.table(),
            render_assignments(&self.assignments),
            self.filter.render()
        ))
    }

    /// Runs the update and returns the number of affected rows.
    pub fn update_all(&self) -> Result<usize> {
        self.store.execute_sql(&self.to_sql()?)
    }

    /// Same as [`update_all`](Self::update_all).
    pub fn perform_update(&self) -> Result<usize> {
        self.update_all()
    }

    /// Runs the update and, when the assignments include the identifier,
    /// returns the record stored under that identifier.
    pub fn update_one(&self) -> Result<Option<R>> {
        let affected = self.update_all()?;
        if affected == 0 {
            return Ok(None);
        }
        let Some(value) = self.assignments.get(ID_COLUMN) else {
            return Ok(None);
        };
        let id = Option::<i64>::decode(value.clone()).map_err(|message| {
            MappingError::Conversion {
                column: ID_COLUMN.to_string(),
                message,
            }
        })?;
        self.store.find_by_id::<R>(id)
    }
}

impl<R: Record> Conditional for Update<'_, R> {
    fn filter_mut(&mut self) -> &mut Filter {
        &mut self.filter
    }
}

/// A DELETE over one record table.
pub struct Delete<'s, R: Record> {
    store: &'s Store,
    schema: Arc<Schema<R>>,
    filter: Filter,
}

impl<'s, R: Record> Delete<'s, R> {
    pub(crate) fn new(store: &'s Store, schema: Arc<Schema<R>>) -> Self {
        Self {
            store,
            schema,
            filter: Filter::new(),
        }
    }

    /// Renders the statement. Without WHERE clauses it deletes every row.
    pub fn to_sql(&self) -> String {
        format!("DELETE FROM {}{}", self.schema.table(), self.filter.render())
    }

    /// Runs the delete and returns the number of removed rows.
    pub fn perform_delete(&self) -> Result<usize> {
        self.store.execute_sql(&self.to_sql())
    }
}

impl<R: Record> Conditional for Delete<'_, R> {
    fn filter_mut(&mut self) -> &mut Filter {
        &mut self.filter
    }
}

/// An INSERT of one row into a record table.
pub struct Insert<'s, R: Record> {
    store: &'s Store,
    schema: Arc<Schema<R>>,
    values: Row,
}

impl<'s, R: Record> Insert<'s, R> {
    pub(crate) fn new(store: &'s Store, schema: Arc<Schema<R>>) -> Self {
        Self {
            store,
            schema,
            values: Row::new(),
        }
    }

    /// Sets the value of one column.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(column, value);
        self
    }

    /// Sets every column of `row`, typically produced by
    /// [`to_row`](lightrow_core::to_row).
    pub fn values(mut self, row: Row) -> Self {
        for (column, value) in row {
            self.values.insert(column, value);
        }
        self
    }

    /// Renders the statement.
    pub fn to_sql(&self) -> String {
        format!(
            "INSERT INTO {}{}",
            self.schema.table(),
            render_values(&self.values)
        )
    }

    /// Runs the insert and returns the new row id.
    ///
    /// A failed insert (constraint violation, missing table...) is logged
    /// and reported as `None`.
    pub fn execute(&self) -> Option<i64> {
        match self.store.execute_sql(&self.to_sql()) {
            Ok(_) => Some(self.store.connection().last_insert_rowid()),
            Err(err) => {
                warn!(table = %self.schema.table(), error = %err, "insert failed");
                None
            }
        }
    }

    /// Runs the insert and reads the stored row back as a record.
    pub fn perform_insert(&self) -> Result<Option<R>> {
        let Some(rowid) = self.execute() else {
            return Ok(None);
        };
        let sql = format!("SELECT * FROM {} WHERE rowid = {rowid}", self.schema.table());
        self.store.query_first(&sql, |row| Ok(from_source::<R>(row)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightrow_core::{RecordDef, field};

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Task {
        id: Option<i64>,
        title: String,
        done: bool,
        rank: i32,
    }

    impl Record for Task {
        fn define() -> RecordDef<Self> {
            RecordDef::new()
                .field(field!(Task, id).column(ID_COLUMN))
                .field(field!(Task, title))
                .field(field!(Task, done))
                .field(field!(Task, rank))
        }

        fn blank() -> Self {
            Self::default()
        }
    }

    fn store() -> Store {
        let store = Store::open_in_memory().unwrap();
        store.create_table::<Task>().unwrap();
        store
    }

    #[test]
    fn test_select_to_sql_is_repeatable() {
        let store = store();
        let select = store
            .select::<Task>()
            .unwrap()
            .where_equals("done", [false])
            .order_by(["rank DESC", "title"])
            .limit(5)
            .offset(10);
        let expected =
            "SELECT * FROM Task WHERE done = 0 ORDER BY rank DESC,title LIMIT 5 OFFSET 10";
        assert_eq!(select.to_sql(), expected);
        assert_eq!(select.to_sql(), expected);
    }

    #[test]
    fn test_select_columns_projection() {
        let store = store();
        let select = store.select_columns::<Task, _, _>(["title", "rank"]).unwrap();
        assert_eq!(select.to_sql(), "SELECT title,rank FROM Task");
    }

    #[test]
    fn test_offset_without_limit() {
        let store = store();
        let select = store.select::<Task>().unwrap().offset(3);
        assert_eq!(select.to_sql(), "SELECT * FROM Task LIMIT -1 OFFSET 3");
    }

    #[test]
    fn test_update_to_sql() {
        let store = store();
        let update = store
            .update::<Task>()
            .unwrap()
            .set("rank", 1)
            .set("title", "x")
            .set("rank", 2)
            .where_raw("title='y'");
        assert_eq!(
            update.to_sql().unwrap(),
            "UPDATE Task SET rank=2,title='x' WHERE (title='y')"
        );
        let update = update.unset("title");
        assert_eq!(update.to_sql().unwrap(), "UPDATE Task SET rank=2 WHERE (title='y')");
    }

    #[test]
    fn test_update_without_assignments() {
        let store = store();
        let update = store.update::<Task>().unwrap().set("rank", 1).unset("rank");
        assert!(matches!(update.to_sql(), Err(StoreError::EmptyAssignment(ref t)) if t == "Task"));
        assert!(matches!(update.update_all(), Err(StoreError::EmptyAssignment(_))));
    }

    #[test]
    fn test_delete_to_sql() {
        let store = store();
        assert_eq!(store.delete::<Task>().unwrap().to_sql(), "DELETE FROM Task");
        let delete = store.delete::<Task>().unwrap().where_less_than("rank", 0);
        assert_eq!(delete.to_sql(), "DELETE FROM Task WHERE rank < 0");
    }

    #[test]
    fn test_insert_to_sql() {
        let store = store();
        let insert = store.insert::<Task>().unwrap().set("title", "a").set("rank", 3);
        assert_eq!(insert.to_sql(), "INSERT INTO Task(title,rank) VALUES ('a',3)");
        assert_eq!(
            store.insert::<Task>().unwrap().to_sql(),
            "INSERT INTO Task DEFAULT VALUES"
        );
    }

    #[test]
    fn test_perform_insert_returns_stored_record() {
        let store = store();
        let task = store
            .insert::<Task>()
            .unwrap()
            .set("title", "write docs")
            .set("done", true)
            .perform_insert()
            .unwrap()
            .unwrap();
        assert!(task.id.is_some());
        assert_eq!(task.title, "write docs");
        assert!(task.done);
    }

    #[test]
    fn test_insert_failure_is_none() {
        let store = Store::open_in_memory().unwrap();
        let id = store.insert::<Task>().unwrap().set("title", "orphan").execute();
        assert_eq!(id, None);
    }

    #[test]
    fn test_update_one_refetches_by_identifier() {
        let store = store();
        let id = store.insert::<Task>().unwrap().set("title", "a").execute();
        let task = store
            .update::<Task>()
            .unwrap()
            .set(ID_COLUMN, id)
            .set("rank", 9)
            .where_equals(ID_COLUMN, [id])
            .update_one()
            .unwrap()
            .unwrap();
        assert_eq!(task.rank, 9);

        let none = store
            .update::<Task>()
            .unwrap()
            .set("rank", 1)
            .where_equals(ID_COLUMN, [id])
            .update_one()
            .unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_one_all_and_rows() {
        let store = store();
        for (title, rank) in [("a", 1), ("b", 2), ("c", 3)] {
            store
                .insert::<Task>()
                .unwrap()
                .set("title", title)
                .set("rank", rank)
                .execute()
                .unwrap();
        }

        let all = store.select::<Task>().unwrap().order_by(["rank"]).all().unwrap();
        assert_eq!(
            all.iter().map(|t| t.title.as_str()).collect::<Vec<_>>(),
            ["a", "b", "c"]
        );

        let top = store
            .select::<Task>()
            .unwrap()
            .order_by(["rank DESC"])
            .one()
            .unwrap()
            .unwrap();
        assert_eq!(top.title, "c");

        let narrowed = store
            .select_columns::<Task, _, _>(["title"])
            .unwrap()
            .where_greater_than_or_equals("rank", 2);
        let rows = narrowed.rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].columns().collect::<Vec<_>>(), ["title"]);

        let records = narrowed.all().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|t| t.id.is_some()));
        assert_eq!(narrowed.count().unwrap(), 2);
    }
}
