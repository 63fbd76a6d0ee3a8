//! Error types for store operations.
//!
//! Provides a unified error type covering database access, record mapping,
//! configuration and statement validation failures.

use lightrow_core::MappingError;
use thiserror::Error;

/// Errors that can occur while operating a [`Store`](crate::Store).
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite operation failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record schema or value conversion failure.
    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// An update was run without any column to assign.
    #[error("update on table '{0}' has no columns to set")]
    EmptyAssignment(String),

    /// Store configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
