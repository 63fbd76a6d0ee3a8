//! Record types and their field declarations.
//!
//! A record type lists its fields once, in [`Record::define`], as a
//! [`RecordDef`] of [`Field`] descriptors. Each descriptor carries the field
//! name, an optional column override, index/ignore markers and typed accessor
//! functions, so reading and writing a field never needs runtime reflection.
//!
//! # Example
//!
//! ```
//! use lightrow_core::{Record, RecordDef, field, schema_for};
//!
//! #[derive(Default)]
//! struct User {
//!     id: Option<i64>,
//!     username: String,
//!     email: String,
//! }
//!
//! impl Record for User {
//!     fn define() -> RecordDef<Self> {
//!         RecordDef::new()
//!             .field(field!(User, id).column("_id"))
//!             .field(field!(User, username).index())
//!             .field(field!(User, email))
//!     }
//!
//!     fn blank() -> Self {
//!         Self::default()
//!     }
//! }
//!
//! let schema = schema_for::<User>().unwrap();
//! assert_eq!(schema.table(), "User");
//! assert_eq!(schema.columns(), ["_id", "username", "email"]);
//! ```

use std::sync::Arc;

use crate::error::{MappingError, Result};
use crate::value::{FieldKind, FieldValue, Value};

/// Column name reserved for the integer primary key.
pub const ID_COLUMN: &str = "_id";

/// A Rust type mapped to one table.
///
/// Exactly one field should map to [`ID_COLUMN`] and have type
/// `Option<i64>`; it is unset until the record is persisted.
pub trait Record: Sized + Send + Sync + 'static {
    /// Declares the table name override and the fields of this record.
    fn define() -> RecordDef<Self>;

    /// Creates an instance to hydrate from a stored row.
    ///
    /// This is not a user-facing constructor: it must not run any
    /// initialization logic, because every mapped field is overwritten right
    /// after.
    fn blank() -> Self;
}

type Getter<R> = Arc<dyn Fn(&R) -> Value + Send + Sync>;
type Setter<R> = Arc<dyn Fn(&mut R, Value) -> std::result::Result<(), String> + Send + Sync>;

struct Access<R> {
    get: Getter<R>,
    set: Setter<R>,
}

impl<R> Clone for Access<R> {
    fn clone(&self) -> Self {
        Self {
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
        }
    }
}

/// Descriptor of one record field.
pub struct Field<R> {
    name: &'static str,
    column: Option<&'static str>,
    kind: FieldKind,
    ignored: bool,
    indexed: bool,
    access: Option<Access<R>>,
}

impl<R: 'static> Field<R> {
    /// Declares a field through its shared and mutable accessors.
    ///
    /// The [`field!`](crate::field) macro writes both accessors for a plain
    /// struct field.
    pub fn new<T: FieldValue + 'static>(
        name: &'static str,
        get: fn(&R) -> &T,
        get_mut: fn(&mut R) -> &mut T,
    ) -> Self {
        Self {
            name,
            column: None,
            kind: T::kind(),
            ignored: false,
            indexed: false,
            access: Some(Access {
                get: Arc::new(move |record: &R| get(record).encode()),
                set: Arc::new(move |record: &mut R, value: Value| {
                    *get_mut(record) = T::decode(value)?;
                    Ok(())
                }),
            }),
        }
    }

    /// Declares a field that holds another record directly.
    ///
    /// Such a field cannot be stored; deriving a schema that contains one,
    /// ignored or not, fails with [`MappingError::BareRecordReference`].
    /// Use a [`ForeignKey`](crate::ForeignKey) instead.
    pub fn reference<P: 'static>(name: &'static str) -> Self {
        Self {
            name,
            column: None,
            kind: FieldKind::Record(std::any::type_name::<P>()),
            ignored: false,
            indexed: false,
            access: None,
        }
    }

    /// Stores the field under `column` instead of its own name.
    pub fn column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    /// Excludes the field from the schema.
    pub fn ignore(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Requests an index on the field's column.
    pub fn index(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// Lifts a parent record's field onto a record that embeds the parent.
    fn lift<C: 'static>(self, parent: fn(&C) -> &R, parent_mut: fn(&mut C) -> &mut R) -> Field<C>
    where
        R: 'static,
    {
        let access = self.access.map(|access| {
            let get = access.get;
            let set = access.set;
            Access {
                get: Arc::new(move |child: &C| get(parent(child))) as Getter<C>,
                set: Arc::new(move |child: &mut C, value: Value| set(parent_mut(child), value))
                    as Setter<C>,
            }
        });
        Field {
            name: self.name,
            column: self.column,
            kind: self.kind,
            ignored: self.ignored,
            indexed: self.indexed,
            access,
        }
    }
}

impl<R> Field<R> {
    /// Field name as declared.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Column the field is stored in: the override if any, else the name.
    pub fn column_name(&self) -> &'static str {
        self.column.unwrap_or(self.name)
    }

    /// Storage family of the field.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns `true` if the field is excluded from the schema.
    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    /// Returns `true` if the field's column should be indexed.
    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    /// Encodes the field's current value.
    pub fn read(&self, record: &R) -> Value {
        match &self.access {
            Some(access) => (access.get)(record),
            None => Value::Null,
        }
    }

    /// Decodes `value` into the field.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::Conversion`] if the value cannot be coerced
    /// into the field's type, or if the field has no accessors.
    pub fn write(&self, record: &mut R, value: Value) -> Result<()> {
        let access = self.access.as_ref().ok_or_else(|| {
            MappingError::conversion(self.column_name(), "field cannot be written")
        })?;
        (access.set)(record, value)
            .map_err(|message| MappingError::conversion(self.column_name(), message))
    }
}

impl<R> std::fmt::Debug for Field<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("column", &self.column_name())
            .field("kind", &self.kind)
            .field("ignored", &self.ignored)
            .field("indexed", &self.indexed)
            .finish()
    }
}

/// The declaration a record type hands to the schema registry.
pub struct RecordDef<R> {
    table: Option<String>,
    fields: Vec<Field<R>>,
    inherited: Vec<Field<R>>,
}

impl<R: Record> RecordDef<R> {
    /// Starts an empty declaration; the table defaults to the type name.
    pub fn new() -> Self {
        Self {
            table: None,
            fields: Vec::new(),
            inherited: Vec::new(),
        }
    }

    /// Overrides the table name.
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table = Some(name.into());
        self
    }

    /// Appends a field.
    pub fn field(mut self, field: Field<R>) -> Self {
        self.fields.push(field);
        self
    }

    /// Includes every field of an embedded parent record.
    ///
    /// Parent fields are placed after the record's own fields, in the
    /// parent's declaration order (including the parent's own parents). The
    /// parent's table name is not used.
    pub fn extends<P: Record>(
        mut self,
        parent: fn(&R) -> &P,
        parent_mut: fn(&mut R) -> &mut P,
    ) -> Self {
        let def = P::define();
        for field in def.fields.into_iter().chain(def.inherited) {
            self.inherited.push(field.lift(parent, parent_mut));
        }
        self
    }

    pub(crate) fn into_parts(self) -> (Option<String>, Vec<Field<R>>) {
        let mut fields = self.fields;
        fields.extend(self.inherited);
        (self.table, fields)
    }
}

impl<R: Record> Default for RecordDef<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Declares a [`Field`] for a plain struct field.
///
/// `field!(Person, age)` expands to a field named `"age"` reading and
/// writing `Person::age`.
#[macro_export]
macro_rules! field {
    ($record:ty, $name:ident) => {
        $crate::Field::new(
            stringify!($name),
            |record: &$record| &record.$name,
            |record: &mut $record| &mut record.$name,
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Sample {
        count: i32,
        label: Option<String>,
    }

    #[test]
    fn test_field_read_write() {
        let field: Field<Sample> = field!(Sample, count);
        let mut sample = Sample::default();
        field.write(&mut sample, Value::Integer(4)).unwrap();
        assert_eq!(sample.count, 4);
        assert_eq!(field.read(&sample), Value::Integer(4));
        assert_eq!(field.kind(), FieldKind::Integer);
    }

    #[test]
    fn test_field_write_conversion_error_names_column() {
        let field: Field<Sample> = field!(Sample, count).column("cnt");
        let mut sample = Sample::default();
        let err = field.write(&mut sample, Value::Text("many".into())).unwrap_err();
        assert!(matches!(err, MappingError::Conversion { ref column, .. } if column == "cnt"));
    }

    #[test]
    fn test_column_override_and_markers() {
        let field: Field<Sample> = field!(Sample, label).column("title").index();
        assert_eq!(field.name(), "label");
        assert_eq!(field.column_name(), "title");
        assert!(field.is_indexed());
        assert!(!field.is_ignored());
        assert!(field!(Sample, label).ignore().is_ignored());
    }

    #[test]
    fn test_reference_field_has_no_access() {
        let field: Field<Sample> = Field::reference::<Sample>("other");
        let mut sample = Sample::default();
        assert_eq!(field.read(&sample), Value::Null);
        assert!(field.write(&mut sample, Value::Integer(1)).is_err());
        assert!(matches!(field.kind(), FieldKind::Record(_)));
    }
}
