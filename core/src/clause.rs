//! SQL clause fragments shared by the statement builders.
//!
//! [`Filter`] accumulates WHERE fragments that are ANDed together at render
//! time. [`Conditional`] gives any builder that owns a filter the fluent
//! `where_*` methods. [`Window`] holds LIMIT/OFFSET, and the `render_*`
//! helpers produce the SET and VALUES lists of mutation statements.
//!
//! Every value that reaches the SQL text goes through
//! [`quote_literal`](crate::quote_literal); only [`Conditional::where_raw`]
//! inserts caller text verbatim.

use crate::row::Row;
use crate::value::{Value, quote_literal};

/// Accumulated WHERE fragments.
///
/// # Examples
///
/// ```
/// use lightrow_core::{Filter, Value};
///
/// let mut filter = Filter::new();
/// filter.equals("name", [Value::from("Alice"), Value::Null]);
/// filter.compare("age", ">=", &Value::from(18));
///
/// assert_eq!(
///     filter.render(),
///     " WHERE (name = 'Alice' OR name IS NULL) AND age >= 18"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    fragments: Vec<String>,
}

impl Filter {
    /// Creates an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `(predicate)` verbatim.
    pub fn raw(&mut self, predicate: &str) {
        self.fragments.push(format!("({predicate})"));
    }

    /// Appends one fragment matching any of `values`.
    ///
    /// A null candidate renders as `column IS NULL`. Several candidates are
    /// ORed inside parentheses so they stay grouped next to other fragments.
    /// An empty candidate list appends nothing.
    pub fn equals<I, V>(&mut self, column: &str, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let alternatives: Vec<String> = values
            .into_iter()
            .map(|value| match value.into() {
                Value::Null => format!("{column} IS NULL"),
                value => format!("{column} = {}", quote_literal(&value)),
            })
            .collect();
        match alternatives.len() {
            0 => {}
            1 => self.fragments.extend(alternatives),
            _ => self.fragments.push(format!("({})", alternatives.join(" OR "))),
        }
    }

    /// Appends `column <> value`, or `column IS NOT NULL` for null.
    pub fn not_equals(&mut self, column: &str, value: &Value) {
        if value.is_null() {
            self.fragments.push(format!("{column} IS NOT NULL"));
        } else {
            self.compare(column, "<>", value);
        }
    }

    /// Appends `column <op> value`.
    pub fn compare(&mut self, column: &str, op: &str, value: &Value) {
        self.fragments.push(format!("{column} {op} {}", quote_literal(value)));
    }

    /// Appends `column BETWEEN low AND high`.
    pub fn between(&mut self, column: &str, low: &Value, high: &Value) {
        self.fragments.push(format!(
            "{column} BETWEEN {} AND {}",
            quote_literal(low),
            quote_literal(high)
        ));
    }

    /// Number of fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Returns `true` if no fragment has been added.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// The fragments in insertion order.
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// Renders ` WHERE f1 AND f2 ...`, or an empty string without fragments.
    pub fn render(&self) -> String {
        if self.fragments.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.fragments.join(" AND "))
        }
    }
}

/// Fluent WHERE methods for builders that own a [`Filter`].
///
/// Each method consumes the builder, appends one fragment and returns it.
pub trait Conditional: Sized {
    /// The builder's filter.
    fn filter_mut(&mut self) -> &mut Filter;

    /// Adds a raw predicate, wrapped in parentheses. The caller is
    /// responsible for escaping anything inside it.
    fn where_raw(mut self, predicate: &str) -> Self {
        self.filter_mut().raw(predicate);
        self
    }

    /// Matches rows where `column` equals any of `values`.
    ///
    /// An empty list leaves the builder unchanged.
    fn where_equals<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.filter_mut().equals(column, values);
        self
    }

    /// Matches rows where `column` differs from `value` (or is not null).
    fn where_not_equals(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filter_mut().not_equals(column, &value.into());
        self
    }

    /// `column < value`.
    fn where_less_than(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filter_mut().compare(column, "<", &value.into());
        self
    }

    /// `column <= value`.
    fn where_less_than_or_equals(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filter_mut().compare(column, "<=", &value.into());
        self
    }

    /// `column > value`.
    fn where_greater_than(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filter_mut().compare(column, ">", &value.into());
        self
    }

    /// `column >= value`.
    fn where_greater_than_or_equals(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filter_mut().compare(column, ">=", &value.into());
        self
    }

    /// `column BETWEEN low AND high`.
    fn where_between(
        mut self,
        column: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        self.filter_mut().between(column, &low.into(), &high.into());
        self
    }
}

impl Conditional for Filter {
    fn filter_mut(&mut self) -> &mut Filter {
        self
    }
}

/// LIMIT and OFFSET of a select.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    /// Maximum number of rows.
    pub limit: Option<u64>,
    /// Number of rows to skip.
    pub offset: Option<u64>,
}

impl Window {
    /// Renders ` LIMIT n OFFSET m` for the parts that are set.
    ///
    /// SQLite only accepts OFFSET after a LIMIT, so an offset alone renders
    /// with `LIMIT -1`.
    pub fn render(&self) -> String {
        match (self.limit, self.offset) {
            (None, None) => String::new(),
            (Some(limit), None) => format!(" LIMIT {limit}"),
            (Some(limit), Some(offset)) => format!(" LIMIT {limit} OFFSET {offset}"),
            (None, Some(offset)) => format!(" LIMIT -1 OFFSET {offset}"),
        }
    }
}

/// Renders ` ORDER BY a,b` or an empty string.
pub fn render_order(columns: &[String]) -> String {
    if columns.is_empty() {
        String::new()
    } else {
        format!(" ORDER BY {}", columns.join(","))
    }
}

/// Renders `a=1,b='x'` for an UPDATE's SET clause.
pub fn render_assignments(row: &Row) -> String {
    row.iter()
        .map(|(column, value)| format!("{column}={}", quote_literal(value)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Renders `(a,b) VALUES (1,'x')` for an INSERT, or ` DEFAULT VALUES` for
/// an empty row.
pub fn render_values(row: &Row) -> String {
    if row.is_empty() {
        return " DEFAULT VALUES".to_string();
    }
    let columns = row.columns().collect::<Vec<_>>().join(",");
    let values = row
        .values()
        .map(quote_literal)
        .collect::<Vec<_>>()
        .join(",");
    format!("({columns}) VALUES ({values})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_raw_is_parenthesized() {
        let filter = Filter::new().where_raw("name='Alice' OR age > 3");
        assert_eq!(filter.render(), " WHERE (name='Alice' OR age > 3)");
    }

    #[test]
    fn test_where_equals_empty_is_noop() {
        let before = Filter::new().where_raw("a = 1");
        let after = before.clone().where_equals("b", Vec::<Value>::new());
        assert_eq!(after.len(), before.len());
        assert_eq!(after.render(), before.render());
    }

    #[test]
    fn test_where_equals_alternatives() {
        let filter = Filter::new().where_equals("id", [1, 2, 3]);
        assert_eq!(filter.fragments(), ["(id = 1 OR id = 2 OR id = 3)"]);
    }

    #[test]
    fn test_where_equals_groups_next_to_other_fragments() {
        let filter = Filter::new()
            .where_equals("kind", ["a"])
            .where_equals("tag", [Value::from("x"), Value::Null])
            .where_greater_than("age", 3);
        assert_eq!(
            filter.render(),
            " WHERE kind = 'a' AND (tag = 'x' OR tag IS NULL) AND age > 3"
        );
    }

    #[test]
    fn test_comparisons() {
        let filter = Filter::new()
            .where_not_equals("a", 1)
            .where_not_equals("b", Value::Null)
            .where_less_than("c", 2)
            .where_less_than_or_equals("d", 3)
            .where_greater_than("e", 4)
            .where_greater_than_or_equals("f", 5)
            .where_between("g", 6, 7);
        assert_eq!(
            filter.fragments(),
            [
                "a <> 1",
                "b IS NOT NULL",
                "c < 2",
                "d <= 3",
                "e > 4",
                "f >= 5",
                "g BETWEEN 6 AND 7",
            ]
        );
    }

    #[test]
    fn test_values_are_quoted() {
        let filter = Filter::new()
            .where_equals("name", ["O'Hara"])
            .where_between("tag", "a'", "z'");
        assert_eq!(
            filter.render(),
            " WHERE name = 'O''Hara' AND tag BETWEEN 'a''' AND 'z'''"
        );
    }

    #[test]
    fn test_empty_filter_renders_nothing() {
        assert_eq!(Filter::new().render(), "");
    }

    #[test]
    fn test_window_render() {
        let window = |limit, offset| Window { limit, offset }.render();
        assert_eq!(window(None, None), "");
        assert_eq!(window(Some(5), None), " LIMIT 5");
        assert_eq!(window(Some(5), Some(10)), " LIMIT 5 OFFSET 10");
        assert_eq!(window(None, Some(10)), " LIMIT -1 OFFSET 10");
    }

    #[test]
    fn test_render_order() {
        assert_eq!(render_order(&[]), "");
        assert_eq!(
            render_order(&["age DESC".to_string(), "name".to_string()]),
            " ORDER BY age DESC,name"
        );
    }

    #[test]
    fn test_render_assignments_and_values() {
        let row: Row = [("name", Value::from("Al")), ("age", Value::Null)]
            .into_iter()
            .collect();
        assert_eq!(render_assignments(&row), "name='Al',age=NULL");
        assert_eq!(render_values(&row), "(name,age) VALUES ('Al',NULL)");
        assert_eq!(render_values(&Row::new()), " DEFAULT VALUES");
    }
}
