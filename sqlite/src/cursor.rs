//! Adapter between `rusqlite` result rows and the record marshaller.
//!
//! [`SqliteRow`] exposes a live `rusqlite::Row` through the
//! [`RowSource`] contract, so [`from_source`](lightrow_core::from_source)
//! can hydrate records straight from a cursor without an intermediate copy.
//! The statement that produced the row stays owned by the caller and is
//! released when it goes out of scope.

use lightrow_core::{MappingError, Row, RowSource, Value};
use rusqlite::types::ValueRef;

/// Converts a borrowed SQLite value into an owned [`Value`].
///
/// Text that is not valid UTF-8 is decoded lossily.
pub(crate) fn value_from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}

/// A positioned `rusqlite` row, readable by column name.
pub struct SqliteRow<'a, 'stmt> {
    row: &'a rusqlite::Row<'stmt>,
}

impl<'a, 'stmt> SqliteRow<'a, 'stmt> {
    /// Wraps the row the cursor currently points at.
    pub fn new(row: &'a rusqlite::Row<'stmt>) -> Self {
        Self { row }
    }

    /// Copies every column of the row into a [`Row`].
    pub fn to_row(&self) -> lightrow_core::Result<Row> {
        let stmt = self.row.as_ref();
        let mut out = Row::with_capacity(stmt.column_count());
        for index in 0..stmt.column_count() {
            let name = stmt
                .column_name(index)
                .map_err(|e| conversion(index.to_string(), e))?;
            out.insert(name, self.value_at(index)?);
        }
        Ok(out)
    }
}

impl RowSource for SqliteRow<'_, '_> {
    fn column_count(&self) -> usize {
        self.row.as_ref().column_count()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.row.as_ref().column_index(name).ok()
    }

    fn value_at(&self, index: usize) -> lightrow_core::Result<Value> {
        self.row.get_ref(index).map(value_from_ref).map_err(|e| {
            let column = self
                .row
                .as_ref()
                .column_name(index)
                .map_or_else(|_| index.to_string(), str::to_string);
            conversion(column, e)
        })
    }
}

fn conversion(column: String, err: rusqlite::Error) -> MappingError {
    MappingError::Conversion {
        column,
        message: err.to_string(),
    }
}
