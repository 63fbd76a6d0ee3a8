//! Table DDL generated from record schemas.
//!
//! Columns are declared without a type so SQLite's dynamic typing stores
//! each value with the affinity it was written with. The identifier column
//! becomes the `integer primary key` (an alias of the rowid). Indexed fields
//! get their own `CREATE INDEX` statement named `idx_<table>_<column>`.
//!
//! Every statement uses `IF [NOT] EXISTS`, so the generated SQL is safe to
//! run repeatedly.

use lightrow_core::{ID_COLUMN, Record, Schema};

/// Renders the `CREATE TABLE IF NOT EXISTS` statement for a record's table.
///
/// # Examples
///
/// ```
/// use lightrow_core::{ID_COLUMN, Record, RecordDef, field, schema_for};
/// use lightrow_sqlite::create_table_sql;
///
/// #[derive(Default)]
/// struct Person { id: Option<i64>, name: String, age: i32 }
///
/// impl Record for Person {
///     fn define() -> RecordDef<Self> {
///         RecordDef::new()
///             .field(field!(Person, id).column(ID_COLUMN))
///             .field(field!(Person, name))
///             .field(field!(Person, age))
///     }
///     fn blank() -> Self { Self::default() }
/// }
///
/// let schema = schema_for::<Person>().unwrap();
/// assert_eq!(
///     create_table_sql(&schema),
///     "CREATE TABLE IF NOT EXISTS Person(_id integer primary key,name,age)"
/// );
/// ```
pub fn create_table_sql<R: Record>(schema: &Schema<R>) -> String {
    let columns: Vec<String> = schema
        .columns()
        .iter()
        .map(|column| {
            if column == ID_COLUMN {
                format!("{column} integer primary key")
            } else {
                column.clone()
            }
        })
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {}({})",
        schema.table(),
        columns.join(",")
    )
}

/// Renders one `CREATE INDEX IF NOT EXISTS` statement per indexed column.
pub fn create_index_sql<R: Record>(schema: &Schema<R>) -> Vec<String> {
    let table = schema.table();
    schema
        .pairs()
        .filter(|(column, field)| field.is_indexed() && *column != ID_COLUMN)
        .map(|(column, _)| {
            format!("CREATE INDEX IF NOT EXISTS idx_{table}_{column} ON {table}({column})")
        })
        .collect()
}

/// Renders the `DROP TABLE IF EXISTS` statement for a record's table.
///
/// Dropping the table also drops its indexes.
pub fn drop_table_sql<R: Record>(schema: &Schema<R>) -> String {
    format!("DROP TABLE IF EXISTS {}", schema.table())
}

/// The table and index statements joined into one batch.
pub(crate) fn create_batch<R: Record>(schema: &Schema<R>) -> String {
    let mut statements = vec![create_table_sql(schema)];
    statements.extend(create_index_sql(schema));
    let mut batch = statements.join(";\n");
    batch.push(';');
    batch
}
