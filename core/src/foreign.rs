//! Typed references between records.

use std::fmt;
use std::marker::PhantomData;

use crate::error::Result;
use crate::record::Record;
use crate::schema::schema_for;
use crate::value::{FieldKind, FieldValue, Value};

/// A reference to a row of record type `R`, stored as its id only.
///
/// The referenced record is never embedded; resolving the reference is a
/// fresh lookup against the store, so a resolved copy can go stale.
///
/// # Examples
///
/// ```
/// use lightrow_core::{ForeignKey, Value};
///
/// struct User;
///
/// let author: ForeignKey<User> = ForeignKey::new(Some(7));
/// assert_eq!(author.id(), Some(7));
/// assert_eq!(Value::from(&author), Value::Integer(7));
/// assert!(!ForeignKey::<User>::unset().is_set());
/// ```
pub struct ForeignKey<R> {
    id: Option<i64>,
    marker: PhantomData<fn() -> R>,
}

impl<R> ForeignKey<R> {
    /// Creates a reference holding `id`.
    pub fn new(id: Option<i64>) -> Self {
        Self {
            id,
            marker: PhantomData,
        }
    }

    /// Creates a reference that points nowhere.
    pub fn unset() -> Self {
        Self::new(None)
    }

    /// The referenced id, if set.
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// Points the reference at another id.
    pub fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    /// Returns `true` if an id is held.
    pub fn is_set(&self) -> bool {
        self.id.is_some()
    }
}

impl<R: Record> ForeignKey<R> {
    /// Creates a reference to an existing record, using its current id.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::MissingIdentifier`](crate::MappingError::MissingIdentifier)
    /// if `R` has no `_id` column, or a schema error if `R` is misconfigured.
    pub fn to(record: &R) -> Result<Self> {
        Ok(Self::new(schema_for::<R>()?.id_of(record)?))
    }

    /// Table of the referenced record type.
    pub fn referenced_table(&self) -> Result<String> {
        Ok(schema_for::<R>()?.table().to_string())
    }
}

impl<R> Clone for ForeignKey<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for ForeignKey<R> {}

impl<R> Default for ForeignKey<R> {
    fn default() -> Self {
        Self::unset()
    }
}

impl<R> PartialEq for ForeignKey<R> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<R> Eq for ForeignKey<R> {}

impl<R> fmt::Debug for ForeignKey<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignKey")
            .field("model", &std::any::type_name::<R>())
            .field("id", &self.id)
            .finish()
    }
}

impl<R> From<&ForeignKey<R>> for Value {
    fn from(fk: &ForeignKey<R>) -> Self {
        fk.id.into()
    }
}

impl<R> From<ForeignKey<R>> for Value {
    fn from(fk: ForeignKey<R>) -> Self {
        fk.id.into()
    }
}

impl<R> FieldValue for ForeignKey<R> {
    fn kind() -> FieldKind {
        FieldKind::ForeignKey(std::any::type_name::<R>())
    }

    fn encode(&self) -> Value {
        self.id.into()
    }

    fn decode(value: Value) -> std::result::Result<Self, String> {
        Option::<i64>::decode(value).map(Self::new)
    }
}
