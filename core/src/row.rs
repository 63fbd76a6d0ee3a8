//! The generic row representation and the cursor abstraction.

use std::fmt;

use crate::error::{MappingError, Result};
use crate::value::Value;

/// An insertion-ordered mapping from column name to [`Value`].
///
/// Inserting an existing column replaces its value in place, so the column
/// keeps its original position.
///
/// # Examples
///
/// ```
/// use lightrow_core::{Row, Value};
///
/// let mut row = Row::new();
/// row.insert("name", "Alice");
/// row.insert("age", 30);
/// row.insert("name", "Bob");
///
/// assert_eq!(row.columns().collect::<Vec<_>>(), ["name", "age"]);
/// assert_eq!(row.get("name"), Some(&Value::from("Bob")));
/// assert_eq!(row.to_string(), "{name='Bob', age=30}");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    entries: Vec<(String, Value)>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty row with room for `capacity` columns.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Sets `column` to `value`, returning the previous value if any.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((column, value));
                None
            }
        }
    }

    /// Removes `column`, returning its value if it was present.
    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let pos = self.entries.iter().position(|(c, _)| c == column)?;
        Some(self.entries.remove(pos).1)
    }

    /// Returns the value stored for `column`.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    /// Returns `true` if `column` is present.
    pub fn contains(&self, column: &str) -> bool {
        self.entries.iter().any(|(c, _)| c == column)
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the row holds no columns.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Column names in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    /// Values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// `(column, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (column, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{column}={value}")?;
        }
        f.write_str("}")
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A positioned result row that values can be read from by column.
///
/// This is the cursor contract the marshaller needs: a column lookup that
/// reports absent columns, and a by-index value read.
pub trait RowSource {
    /// Number of columns in the result set.
    fn column_count(&self) -> usize;

    /// Index of `name` in the result set, or `None` if the column was not
    /// selected.
    fn column_index(&self, name: &str) -> Option<usize>;

    /// Reads the value at `index`.
    fn value_at(&self, index: usize) -> Result<Value>;

    /// Reads the value of `name`, or `None` if the column is absent.
    fn value(&self, name: &str) -> Result<Option<Value>> {
        match self.column_index(name) {
            Some(index) => self.value_at(index).map(Some),
            None => Ok(None),
        }
    }
}

impl RowSource for Row {
    fn column_count(&self) -> usize {
        self.entries.len()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(c, _)| c == name)
    }

    fn value_at(&self, index: usize) -> Result<Value> {
        self.entries
            .get(index)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| MappingError::conversion(index.to_string(), "column index out of range"))
    }
}
