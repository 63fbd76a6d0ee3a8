//! Record mapping primitives for lightrow.
//!
//! This crate knows how a Rust struct maps onto a SQL table, but never talks
//! to a database itself:
//!
//! - [`Record`] / [`RecordDef`] / [`Field`]: a record type declares its
//!   fields once, with column overrides, index and ignore markers.
//! - [`schema_for`] derives and caches the [`Schema`] of a record type: table
//!   name, ordered columns, identifier column first.
//! - [`Value`] and [`FieldValue`] convert between field types and storable
//!   scalars; [`quote_literal`] and [`bind_params`] render values as SQL text.
//! - [`to_row`], [`from_source`], [`hydrate`] and [`copy_from`] move whole
//!   records in and out of a [`Row`] or any other [`RowSource`].
//! - [`Filter`], [`Conditional`] and [`Window`] render WHERE, ORDER and
//!   LIMIT clauses for the statement builders.
//! - [`ForeignKey`] stores a reference to another record as its id.
//!
//! The `lightrow-sqlite` crate runs the rendered statements against SQLite.
//!
//! # Example
//!
//! ```
//! use lightrow_core::*;
//!
//! #[derive(Default)]
//! struct Person {
//!     id: Option<i64>,
//!     name: String,
//!     age: i32,
//! }
//!
//! impl Record for Person {
//!     fn define() -> RecordDef<Self> {
//!         RecordDef::new()
//!             .field(field!(Person, id).column(ID_COLUMN))
//!             .field(field!(Person, name).index())
//!             .field(field!(Person, age))
//!     }
//!
//!     fn blank() -> Self {
//!         Self::default()
//!     }
//! }
//!
//! let alice = Person { id: None, name: "Alice".into(), age: 30 };
//! let row = to_row(&alice).unwrap();
//! assert_eq!(row.to_string(), "{_id=NULL, name='Alice', age=30}");
//!
//! let filter = Filter::new()
//!     .where_equals("name", ["Alice"])
//!     .where_greater_than_or_equals("age", 18);
//! assert_eq!(filter.render(), " WHERE name = 'Alice' AND age >= 18");
//! ```

mod clause;
mod error;
mod foreign;
mod marshal;
mod record;
mod row;
mod schema;
mod value;

pub use clause::{Conditional, Filter, Window, render_assignments, render_order, render_values};
pub use error::{MappingError, Result};
pub use foreign::ForeignKey;
pub use marshal::{copy_from, from_source, hydrate, to_row};
pub use record::{Field, ID_COLUMN, Record, RecordDef};
pub use row::{Row, RowSource};
pub use schema::{Schema, schema_for, validate_identifier};
pub use value::{FieldKind, FieldValue, Value, bind_params, decode, quote_literal};
