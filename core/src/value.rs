//! Storable scalar values and the codec between them and record fields.
//!
//! [`Value`] is the closed set of scalars a row can hold. [`FieldValue`] is
//! implemented for every Rust type a record field may have and defines how
//! that type is encoded into a [`Value`] and coerced back out of one.
//!
//! [`quote_literal`] renders a value as an SQL literal and is applied to every
//! value that ends up inside generated SQL text.

use std::fmt::{self, Write as _};

use crate::error::{MappingError, Result};
use crate::row::RowSource;

/// A scalar stored in a single column.
///
/// # Examples
///
/// ```
/// use lightrow_core::Value;
///
/// assert_eq!(Value::from(30), Value::Integer(30));
/// assert_eq!(Value::from("Alice"), Value::Text("Alice".into()));
/// assert_eq!(Value::from(None::<i64>), Value::Null);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// SQL `NULL`.
    #[default]
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit float.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Boolean, stored as `0`/`1`.
    Bool(bool),
    /// Raw bytes.
    Blob(Vec<u8>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the variant, used in conversion error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Bool(_) => "bool",
            Value::Blob(_) => "blob",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&quote_literal(self))
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v.into())
            }
        }
    )*};
}

value_from! {
    i8 => Integer,
    i16 => Integer,
    i32 => Integer,
    i64 => Integer,
    u8 => Integer,
    u16 => Integer,
    u32 => Integer,
    f32 => Real,
    f64 => Real,
    bool => Bool,
    String => Text,
    Vec<u8> => Blob,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Blob(v.to_vec())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// The storage family of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any signed or small unsigned integer.
    Integer,
    /// `f32` or `f64`.
    Real,
    /// `String`.
    Text,
    /// `bool`, stored as an integer.
    Bool,
    /// `Vec<u8>`.
    Blob,
    /// `ForeignKey<R>`; holds the referenced Rust type name.
    ForeignKey(&'static str),
    /// A record held directly instead of through a foreign key. Never valid
    /// in a schema.
    Record(&'static str),
}

/// A Rust type that can live in a record field.
///
/// `encode` turns the field into a storable [`Value`]; `decode` coerces a
/// stored value back, following the same type families. Decoding reports a
/// plain message; the caller attaches the column name.
pub trait FieldValue: Sized {
    /// Storage family of this type.
    fn kind() -> FieldKind;

    /// Converts the field into a storable value.
    fn encode(&self) -> Value;

    /// Coerces a stored value into this type.
    fn decode(value: Value) -> std::result::Result<Self, String>;
}

fn unexpected(value: &Value, target: &str) -> String {
    format!("cannot read {} value as {target}", value.type_name())
}

fn coerce_integer(value: Value) -> std::result::Result<i64, String> {
    match value {
        Value::Integer(i) => Ok(i),
        Value::Bool(b) => Ok(i64::from(b)),
        Value::Real(f) if f.is_finite() && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
            Ok(f.trunc() as i64)
        }
        Value::Text(ref s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .or_else(|_| match trimmed.parse::<f64>() {
                    Ok(f) if f.is_finite() => Ok(f.trunc() as i64),
                    _ => Err(()),
                })
                .map_err(|_| format!("text '{s}' is not an integer"))
        }
        other => Err(unexpected(&other, "integer")),
    }
}

fn coerce_real(value: Value) -> std::result::Result<f64, String> {
    match value {
        Value::Real(f) => Ok(f),
        Value::Integer(i) => Ok(i as f64),
        Value::Bool(b) => Ok(if b { 1.0 } else { 0.0 }),
        Value::Text(ref s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("text '{s}' is not a number")),
        other => Err(unexpected(&other, "real")),
    }
}

macro_rules! integer_field {
    ($($ty:ty),*) => {$(
        impl FieldValue for $ty {
            fn kind() -> FieldKind {
                FieldKind::Integer
            }

            fn encode(&self) -> Value {
                Value::Integer(i64::from(*self))
            }

            fn decode(value: Value) -> std::result::Result<Self, String> {
                let wide = coerce_integer(value)?;
                <$ty>::try_from(wide)
                    .map_err(|_| format!("integer {wide} out of range for {}", stringify!($ty)))
            }
        }
    )*};
}

integer_field!(i8, i16, i32, i64, u8, u16, u32);

impl FieldValue for bool {
    fn kind() -> FieldKind {
        FieldKind::Bool
    }

    fn encode(&self) -> Value {
        Value::Integer(i64::from(*self))
    }

    fn decode(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Integer(i) => Ok(i != 0),
            Value::Real(f) => Ok(f != 0.0),
            Value::Text(ref s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" => Ok(true),
                "0" | "false" => Ok(false),
                _ => Err(format!("text '{s}' is not a boolean")),
            },
            other => Err(unexpected(&other, "bool")),
        }
    }
}

impl FieldValue for f64 {
    fn kind() -> FieldKind {
        FieldKind::Real
    }

    fn encode(&self) -> Value {
        Value::Real(*self)
    }

    fn decode(value: Value) -> std::result::Result<Self, String> {
        coerce_real(value)
    }
}

impl FieldValue for f32 {
    fn kind() -> FieldKind {
        FieldKind::Real
    }

    fn encode(&self) -> Value {
        Value::Real(f64::from(*self))
    }

    fn decode(value: Value) -> std::result::Result<Self, String> {
        coerce_real(value).map(|f| f as f32)
    }
}

impl FieldValue for String {
    fn kind() -> FieldKind {
        FieldKind::Text
    }

    fn encode(&self) -> Value {
        Value::Text(self.clone())
    }

    fn decode(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Integer(i) => Ok(i.to_string()),
            Value::Real(f) => Ok(f.to_string()),
            Value::Bool(b) => Ok(i64::from(b).to_string()),
            Value::Blob(bytes) => {
                String::from_utf8(bytes).map_err(|_| "blob is not valid UTF-8".to_string())
            }
            Value::Null => Err(unexpected(&Value::Null, "text")),
        }
    }
}

impl FieldValue for Vec<u8> {
    fn kind() -> FieldKind {
        FieldKind::Blob
    }

    fn encode(&self) -> Value {
        Value::Blob(self.clone())
    }

    fn decode(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Blob(bytes) => Ok(bytes),
            Value::Text(s) => Ok(s.into_bytes()),
            other => Err(unexpected(&other, "blob")),
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn kind() -> FieldKind {
        T::kind()
    }

    fn encode(&self) -> Value {
        self.as_ref().map_or(Value::Null, FieldValue::encode)
    }

    fn decode(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::decode(other).map(Some),
        }
    }
}

/// Reads `column` from a row source and decodes it as `T`.
///
/// Returns `Ok(None)` when the column is not part of the source, so callers
/// can leave the field untouched for narrowed reads.
///
/// # Examples
///
/// ```
/// use lightrow_core::{Row, decode};
///
/// let mut row = Row::new();
/// row.insert("age", 30);
///
/// assert_eq!(decode::<i32>(&row, "age").unwrap(), Some(30));
/// assert_eq!(decode::<i32>(&row, "height").unwrap(), None);
/// ```
pub fn decode<T: FieldValue>(source: &dyn RowSource, column: &str) -> Result<Option<T>> {
    match source.value(column)? {
        None => Ok(None),
        Some(value) => T::decode(value)
            .map(Some)
            .map_err(|message| MappingError::conversion(column, message)),
    }
}

/// Renders a value as an SQL literal.
///
/// Numbers are emitted bare, text is single-quoted with embedded quotes
/// doubled, blobs use the `X'..'` hex form and booleans become `1`/`0`.
///
/// Reals use the shortest text that parses back to the same `f64` in Rust.
/// SQLite parses that text itself, and near the ends of the exponent range
/// its parse may land one ulp away (`1e-300` is stored as
/// `9.999999999999999e-301`). Values of ordinary magnitude come back
/// exactly.
///
/// # Examples
///
/// ```
/// use lightrow_core::{Value, quote_literal};
///
/// assert_eq!(quote_literal(&Value::from(42)), "42");
/// assert_eq!(quote_literal(&Value::from("O'Brien")), "'O''Brien'");
/// assert_eq!(quote_literal(&Value::Null), "NULL");
/// ```
pub fn quote_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) if f.is_nan() => "NULL".to_string(),
        Value::Real(f) if f.is_infinite() => {
            let literal = if *f > 0.0 { "9e999" } else { "-9e999" };
            literal.to_string()
        }
        Value::Real(f) => format!("{f:?}"),
        Value::Bool(b) => i64::from(*b).to_string(),
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Blob(bytes) => {
            let mut out = String::with_capacity(bytes.len() * 2 + 3);
            out.push_str("X'");
            for byte in bytes {
                let _ = write!(out, "{byte:02X}");
            }
            out.push('\'');
            out
        }
    }
}

/// Substitutes each `?` in `sql`, left to right, with the next parameter's
/// quoted literal.
///
/// Placeholders beyond the supplied parameters stay as a literal `?` and
/// surplus parameters are ignored. Every `?` counts, including one inside a
/// string literal of the query.
///
/// # Examples
///
/// ```
/// use lightrow_core::{Value, bind_params};
///
/// let sql = bind_params("SELECT * FROM Person WHERE name = ? AND age > ?", &[
///     Value::from("Alice"),
///     Value::from(18),
/// ]);
/// assert_eq!(sql, "SELECT * FROM Person WHERE name = 'Alice' AND age > 18");
///
/// assert_eq!(bind_params("a = ? AND b = ?", &[Value::from(1)]), "a = 1 AND b = ?");
/// ```
pub fn bind_params(sql: &str, params: &[Value]) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut params = params.iter();
    for ch in sql.chars() {
        if ch == '?' {
            if let Some(param) = params.next() {
                out.push_str(&quote_literal(param));
                continue;
            }
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Row;

    #[test]
    fn test_encode_scalar_families() {
        assert_eq!(7i8.encode(), Value::Integer(7));
        assert_eq!(7u32.encode(), Value::Integer(7));
        assert_eq!(true.encode(), Value::Integer(1));
        assert_eq!(false.encode(), Value::Integer(0));
        assert_eq!(1.5f32.encode(), Value::Real(1.5));
        assert_eq!("x".to_string().encode(), Value::Text("x".into()));
        assert_eq!(vec![1u8, 2].encode(), Value::Blob(vec![1, 2]));
        assert_eq!(None::<String>.encode(), Value::Null);
        assert_eq!(Some(3i64).encode(), Value::Integer(3));
    }

    #[test]
    fn test_decode_integer_coercions() {
        assert_eq!(i32::decode(Value::Integer(5)), Ok(5));
        assert_eq!(i32::decode(Value::Real(5.9)), Ok(5));
        assert_eq!(i32::decode(Value::Text(" 12 ".into())), Ok(12));
        assert_eq!(i64::decode(Value::Bool(true)), Ok(1));
        assert!(i8::decode(Value::Integer(300)).is_err());
        assert!(i32::decode(Value::Text("abc".into())).is_err());
        assert!(i32::decode(Value::Null).is_err());
    }

    #[test]
    fn test_decode_bool_and_real() {
        assert_eq!(bool::decode(Value::Integer(2)), Ok(true));
        assert_eq!(bool::decode(Value::Integer(0)), Ok(false));
        assert_eq!(bool::decode(Value::Text("TRUE".into())), Ok(true));
        assert!(bool::decode(Value::Text("maybe".into())).is_err());
        assert_eq!(f64::decode(Value::Integer(3)), Ok(3.0));
        assert_eq!(f32::decode(Value::Real(0.5)), Ok(0.5));
    }

    #[test]
    fn test_decode_text_and_blob() {
        assert_eq!(String::decode(Value::Integer(42)), Ok("42".to_string()));
        assert_eq!(String::decode(Value::Blob(b"hi".to_vec())), Ok("hi".to_string()));
        assert!(String::decode(Value::Blob(vec![0xff, 0xfe])).is_err());
        assert_eq!(Vec::<u8>::decode(Value::Text("ab".into())), Ok(b"ab".to_vec()));
    }

    #[test]
    fn test_decode_option_null() {
        assert_eq!(Option::<String>::decode(Value::Null), Ok(None));
        assert_eq!(Option::<i64>::decode(Value::Integer(9)), Ok(Some(9)));
    }

    #[test]
    fn test_decode_absent_column_is_none() {
        let mut row = Row::new();
        row.insert("name", "Alice");
        assert_eq!(decode::<String>(&row, "missing").unwrap(), None);
        assert_eq!(decode::<String>(&row, "name").unwrap(), Some("Alice".to_string()));
    }

    #[test]
    fn test_decode_reports_column_on_failure() {
        let mut row = Row::new();
        row.insert("age", "old");
        let err = decode::<i32>(&row, "age").unwrap_err();
        assert!(matches!(err, MappingError::Conversion { ref column, .. } if column == "age"));
    }

    #[test]
    fn test_quote_literal_escapes_every_quote() {
        let rendered = quote_literal(&Value::from("it's a 'test'"));
        assert_eq!(rendered, "'it''s a ''test'''");
        // Stripping the outer quotes leaves only doubled quotes.
        let inner = &rendered[1..rendered.len() - 1];
        assert!(!inner.replace("''", "").contains('\''));
    }

    #[test]
    fn test_quote_literal_numbers_and_specials() {
        assert_eq!(quote_literal(&Value::Integer(-3)), "-3");
        assert_eq!(quote_literal(&Value::Real(1.0)), "1.0");
        assert_eq!(quote_literal(&Value::Real(0.25)), "0.25");
        assert_eq!(quote_literal(&Value::Real(f64::NAN)), "NULL");
        assert_eq!(quote_literal(&Value::Real(f64::INFINITY)), "9e999");
        assert_eq!(quote_literal(&Value::Bool(true)), "1");
        assert_eq!(quote_literal(&Value::Blob(vec![0x0a, 0xff])), "X'0AFF'");
    }

    #[test]
    fn test_bind_params_quotes_values() {
        let sql = bind_params("name = ?", &[Value::from("x' OR '1'='1")]);
        assert_eq!(sql, "name = 'x'' OR ''1''=''1'");
    }

    #[test]
    fn test_bind_params_surplus_params_ignored() {
        assert_eq!(bind_params("a = ?", &[Value::from(1), Value::from(2)]), "a = 1");
        assert_eq!(bind_params("no placeholders", &[Value::from(1)]), "no placeholders");
    }
}
