//! SQLite storage for lightrow records.
//!
//! Record types are declared with `lightrow-core`; this crate stores them
//! in SQLite through [`rusqlite`].
//!
//! # Architecture
//!
//! - **`store`**: [`Store`], the facade owning the connection, with raw SQL,
//!   record-level CRUD and foreign-key resolution
//! - **`statement`**: fluent [`Select`], [`Update`], [`Delete`] and
//!   [`Insert`] builders
//! - **`schema`**: `CREATE TABLE` / `CREATE INDEX` / `DROP TABLE` generation
//! - **`bootstrap`**: opening a store at a configured version, creating or
//!   recreating its tables
//! - **`config`**: [`StoreConfig`], loaded from YAML or JSON
//! - **`cursor`**: [`SqliteRow`], the bridge from result rows to records
//!
//! # Quick start
//!
//! ```
//! use lightrow_core::{Conditional, ID_COLUMN, Record, RecordDef, field};
//! use lightrow_sqlite::{Bootstrap, StoreConfig, TableSet};
//!
//! #[derive(Debug, Default)]
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
//! let tables = TableSet::new().with::<Person>().unwrap();
//! let (store, _) = Bootstrap::open(&StoreConfig::in_memory(1), &tables).unwrap();
//!
//! let mut alice = Person { id: None, name: "Alice".into(), age: 30 };
//! store.insert_record(&mut alice).unwrap();
//!
//! let adults = store
//!     .select::<Person>()
//!     .unwrap()
//!     .where_greater_than_or_equals("age", 18)
//!     .all()
//!     .unwrap();
//! assert_eq!(adults.len(), 1);
//! ```
//!
//! # Identifiers and literals
//!
//! Table and column names are validated when a schema is derived and then
//! embedded unquoted. Values are always rendered through
//! [`quote_literal`](lightrow_core::quote_literal). Only
//! [`where_raw`](lightrow_core::Conditional::where_raw) and the raw SQL
//! methods take caller text verbatim.

mod bootstrap;
mod config;
mod cursor;
mod error;
mod schema;
mod statement;
mod store;

pub use bootstrap::{Bootstrap, OpenAction, OpenReport, TableSet};
pub use config::{IN_MEMORY, StoreConfig};
pub use cursor::SqliteRow;
pub use error::{Result, StoreError};
pub use schema::{create_index_sql, create_table_sql, drop_table_sql};
pub use statement::{Delete, Insert, Select, Update};
pub use store::{Persist, Store};
