//! Error types for record mapping.
//!
//! Covers configuration mistakes detected while deriving a schema and value
//! conversion failures raised while moving data between records and rows.

use thiserror::Error;

/// Errors that can occur while deriving schemas or marshalling values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MappingError {
    /// The record declares no `_id` column but an identifier was required.
    #[error("record table '{table}' has no identifier column '_id'")]
    MissingIdentifier {
        /// Table of the offending record type.
        table: String,
    },

    /// More than one field maps to the identifier column.
    #[error("record table '{table}' declares the identifier column '_id' more than once")]
    DuplicateIdentifier {
        /// Table of the offending record type.
        table: String,
    },

    /// Two fields map to the same column name.
    #[error("record table '{table}' declares column '{column}' more than once")]
    DuplicateColumn {
        /// Table of the offending record type.
        table: String,
        /// The repeated column name.
        column: String,
    },

    /// A field holds another record directly instead of a `ForeignKey`.
    #[error(
        "field '{field}' of record '{record}' references '{referenced}' directly; \
         wrap it as ForeignKey<{referenced}>"
    )]
    BareRecordReference {
        /// Record type declaring the field.
        record: String,
        /// Field name.
        field: String,
        /// Referenced record type.
        referenced: String,
    },

    /// Table or column name that cannot be interpolated into SQL unquoted.
    #[error("invalid identifier '{0}': must be non-empty and contain only ASCII alphanumerics and underscores")]
    InvalidIdentifier(String),

    /// A stored value could not be coerced into the field's type.
    #[error("cannot convert column '{column}': {message}")]
    Conversion {
        /// Column being read or written.
        column: String,
        /// What went wrong.
        message: String,
    },
}

impl MappingError {
    pub(crate) fn conversion(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            column: column.into(),
            message: message.into(),
        }
    }
}

/// Convenience alias for results with [`MappingError`].
pub type Result<T> = std::result::Result<T, MappingError>;
