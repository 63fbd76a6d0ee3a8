//! Conversion between whole records and rows.

use tracing::error;

use crate::error::Result;
use crate::record::Record;
use crate::row::{Row, RowSource};
use crate::schema::schema_for;

/// Encodes every mapped field of `record` into a [`Row`], in schema order.
///
/// # Examples
///
/// ```
/// use lightrow_core::{Record, RecordDef, Value, field, to_row};
///
/// #[derive(Default)]
/// struct Point { x: i32, y: i32 }
///
/// impl Record for Point {
///     fn define() -> RecordDef<Self> {
///         RecordDef::new().field(field!(Point, x)).field(field!(Point, y))
///     }
///     fn blank() -> Self { Self::default() }
/// }
///
/// let row = to_row(&Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(row.get("y"), Some(&Value::Integer(2)));
/// ```
pub fn to_row<R: Record>(record: &R) -> Result<Row> {
    let schema = schema_for::<R>()?;
    let mut row = Row::with_capacity(schema.columns().len());
    for (column, field) in schema.pairs() {
        row.insert(column, field.read(record));
    }
    Ok(row)
}

/// Builds a record from a result row.
///
/// The instance comes from [`Record::blank`]; every mapped column present in
/// `source` is decoded into its field and absent columns keep the blank
/// value.
pub fn from_source<R: Record>(source: &dyn RowSource) -> Result<R> {
    let mut record = R::blank();
    hydrate(&mut record, source)?;
    Ok(record)
}

/// Overwrites the fields of `record` with the columns present in `source`.
///
/// Fields whose column is not part of `source` are left untouched, which
/// makes narrowed-column reads safe.
///
/// # Errors
///
/// Returns [`MappingError::Conversion`](crate::MappingError::Conversion) on
/// the first column that cannot be coerced into its field. Fields written
/// before the failure keep their new values.
pub fn hydrate<R: Record>(record: &mut R, source: &dyn RowSource) -> Result<()> {
    let schema = schema_for::<R>()?;
    for (column, field) in schema.pairs() {
        let Some(value) = source.value(column)? else {
            continue;
        };
        if let Err(err) = field.write(record, value) {
            error!(table = %schema.table(), "{err}");
            return Err(err);
        }
    }
    Ok(())
}

/// Copies every mapped field from `source` into `target`.
pub fn copy_from<R: Record>(target: &mut R, source: &R) -> Result<()> {
    let schema = schema_for::<R>()?;
    for field in schema.fields() {
        field.write(target, field.read(source))?;
    }
    Ok(())
}
