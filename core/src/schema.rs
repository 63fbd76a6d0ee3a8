//! Schema derivation and the process-wide schema cache.
//!
//! A [`Schema`] is derived from a record's [`RecordDef`](crate::RecordDef):
//! ignored fields are dropped, column overrides are applied, and the
//! identifier column is swapped to position 0. Derivation happens once per
//! record type; [`schema_for`] returns the cached instance afterwards.
//!
//! # Identifiers
//!
//! Table and column names are interpolated into SQL without quoting, so they
//! must be non-empty and contain only ASCII alphanumerics and underscores.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::{debug, error};

use crate::error::{MappingError, Result};
use crate::record::{Field, ID_COLUMN, Record};
use crate::value::{FieldKind, FieldValue, Value};

type Registry = RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Validates that a table or column name can be embedded in SQL unquoted.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(MappingError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

/// Returns the schema of `R`, deriving and caching it on first use.
///
/// Concurrent first calls for the same type all receive the same
/// [`Arc`]: the derivation that wins the write lock is stored and every
/// other caller reads it back. Failed derivations are not cached.
///
/// # Errors
///
/// Returns a [`MappingError`] describing the configuration problem if the
/// record's declaration is invalid.
pub fn schema_for<R: Record>() -> Result<Arc<Schema<R>>> {
    let key = TypeId::of::<R>();

    if let Some(entry) = registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        if let Ok(schema) = Arc::clone(entry).downcast::<Schema<R>>() {
            return Ok(schema);
        }
    }

    let mut cache = registry().write().unwrap_or_else(PoisonError::into_inner);
    if let Some(entry) = cache.get(&key) {
        if let Ok(schema) = Arc::clone(entry).downcast::<Schema<R>>() {
            return Ok(schema);
        }
    }

    let schema = Arc::new(Schema::<R>::derive()?);
    cache.insert(key, Arc::clone(&schema) as Arc<dyn Any + Send + Sync>);
    Ok(schema)
}

/// Derived table layout of a record type.
///
/// `columns()[i]` is the column of `fields()[i]`. When the record has an
/// identifier, it is at index 0.
pub struct Schema<R> {
    table: String,
    columns: Vec<String>,
    fields: Vec<Field<R>>,
}

impl<R: Record> Schema<R> {
    /// Derives the schema of `R` without consulting the cache.
    ///
    /// # Errors
    ///
    /// - [`MappingError::BareRecordReference`] for a field holding a record
    ///   directly, whether ignored or not
    /// - [`MappingError::InvalidIdentifier`] for an unusable table or column
    ///   name
    /// - [`MappingError::DuplicateIdentifier`] / [`MappingError::DuplicateColumn`]
    ///   when two fields share a column
    pub fn derive() -> Result<Self> {
        let (table, declared) = R::define().into_parts();
        let table = table.unwrap_or_else(default_table_name::<R>);
        validate_identifier(&table)?;

        let mut fields = Vec::with_capacity(declared.len());
        for field in declared {
            if let FieldKind::Record(referenced) = field.kind() {
                let err = MappingError::BareRecordReference {
                    record: std::any::type_name::<R>().to_string(),
                    field: field.name().to_string(),
                    referenced: short_type_name(referenced).to_string(),
                };
                error!(table = %table, "{err}");
                return Err(err);
            }
            if field.is_ignored() {
                continue;
            }
            fields.push(field);
        }

        let mut columns: Vec<String> = Vec::with_capacity(fields.len());
        for field in &fields {
            let column = field.column_name();
            validate_identifier(column)?;
            if columns.iter().any(|c| c == column) {
                let err = if column == ID_COLUMN {
                    MappingError::DuplicateIdentifier {
                        table: table.clone(),
                    }
                } else {
                    MappingError::DuplicateColumn {
                        table: table.clone(),
                        column: column.to_string(),
                    }
                };
                error!(table = %table, "{err}");
                return Err(err);
            }
            columns.push(column.to_string());
        }

        if let Some(pos) = columns.iter().position(|c| c == ID_COLUMN) {
            columns.swap(0, pos);
            fields.swap(0, pos);
        }

        debug!(table = %table, columns = ?columns, "derived record schema");
        Ok(Self {
            table,
            columns,
            fields,
        })
    }

    /// Table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Column names, index-aligned with [`fields`](Self::fields).
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Field descriptors, index-aligned with [`columns`](Self::columns).
    pub fn fields(&self) -> &[Field<R>] {
        &self.fields
    }

    /// `(column, field)` pairs in schema order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &Field<R>)> {
        self.columns.iter().map(String::as_str).zip(self.fields.iter())
    }

    /// Looks up a field by its declared name.
    pub fn field(&self, name: &str) -> Option<&Field<R>> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Column a field is stored in, looked up by field name.
    pub fn column_of(&self, field_name: &str) -> Option<&str> {
        self.field(field_name).map(Field::column_name)
    }

    /// Returns `true` if the schema has an `_id` column.
    pub fn has_identifier(&self) -> bool {
        self.columns.first().is_some_and(|c| c == ID_COLUMN)
    }

    /// Returns the identifier column name.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::MissingIdentifier`] if the record has none.
    pub fn identifier(&self) -> Result<&str> {
        if self.has_identifier() {
            Ok(ID_COLUMN)
        } else {
            Err(MappingError::MissingIdentifier {
                table: self.table.clone(),
            })
        }
    }

    /// Reads the identifier of `record`.
    pub fn id_of(&self, record: &R) -> Result<Option<i64>> {
        let column = self.identifier()?;
        Option::<i64>::decode(self.fields[0].read(record))
            .map_err(|message| MappingError::Conversion {
                column: column.to_string(),
                message,
            })
    }

    /// Writes the identifier of `record`.
    pub fn set_id(&self, record: &mut R, id: Option<i64>) -> Result<()> {
        self.identifier()?;
        self.fields[0].write(record, Value::from(id))
    }
}

impl<R> std::fmt::Debug for Schema<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("table", &self.table)
            .field("columns", &self.columns)
            .finish()
    }
}

fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

fn default_table_name<R>() -> String {
    short_type_name(std::any::type_name::<R>()).to_string()
}
