//! Parameterized WHERE-clause composition.
//!
//! A [`Predicate`] is always a fragment together with the arguments bound to its
//! placeholders, so row and count statements built from one
//! [`PredicateBuilder`] see the same conditions in the same argument order.

use serde::Serialize;

/// Positional argument bound to a `?` placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Int(i32),
    BigInt(i64),
    Text(String),
    Bool(bool),
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::BigInt(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

/// A condition fragment and the arguments for its placeholders.
///
/// Fields are private: every constructor emits exactly one `?` per argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    fragment: String,
    args: Vec<SqlValue>,
}

impl Predicate {
    fn compare(column: &str, op: &str, value: impl Into<SqlValue>) -> Self {
        Self {
            fragment: format!("{} {} ?", column, op),
            args: vec![value.into()],
        }
    }

    /// `column = ?`
    pub fn eq(column: &str, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, "=", value)
    }

    /// `column >= ?`
    pub fn ge(column: &str, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, ">=", value)
    }

    /// `column <= ?`
    pub fn le(column: &str, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, "<=", value)
    }

    /// `? = ANY(column)`, membership in an array column
    pub fn contains(array_column: &str, value: impl Into<SqlValue>) -> Self {
        Self {
            fragment: format!("? = ANY({})", array_column),
            args: vec![value.into()],
        }
    }

    /// Fixed condition without arguments, e.g. `require_biology = TRUE`.
    /// Returns `None` if the text contains a placeholder.
    pub fn literal(fragment: impl Into<String>) -> Option<Self> {
        let fragment = fragment.into();
        if fragment.contains('?') {
            return None;
        }
        Some(Self { fragment, args: Vec::new() })
    }

    /// `(column = ? OR column = ? ...)`, one argument per value
    pub fn any_of<I, V>(column: &str, values: I) -> Option<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        Self::or_group(values.into_iter().map(|v| Self::eq(column, v)).collect())
    }

    /// `((a, b) IN ((?, ?), (?, ?) ...))` over a list of value pairs
    pub fn in_pairs<I, A, B>(left: &str, right: &str, pairs: I) -> Option<Self>
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<SqlValue>,
        B: Into<SqlValue>,
    {
        let mut placeholders = Vec::new();
        let mut args = Vec::new();
        for (a, b) in pairs {
            placeholders.push("(?, ?)");
            args.push(a.into());
            args.push(b.into());
        }
        if placeholders.is_empty() {
            return None;
        }
        Some(Self {
            fragment: format!("(({}, {}) IN ({}))", left, right, placeholders.join(", ")),
            args,
        })
    }

    /// Parenthesized OR of the given predicates; `None` when empty
    pub fn or_group(parts: Vec<Predicate>) -> Option<Self> {
        Self::group(parts, " OR ")
    }

    /// Parenthesized AND of the given predicates; `None` when empty
    pub fn and_group(parts: Vec<Predicate>) -> Option<Self> {
        Self::group(parts, " AND ")
    }

    fn group(parts: Vec<Predicate>, separator: &str) -> Option<Self> {
        if parts.is_empty() {
            return None;
        }
        let mut fragments = Vec::with_capacity(parts.len());
        let mut args = Vec::new();
        for part in parts {
            fragments.push(part.fragment);
            args.extend(part.args);
        }
        Some(Self {
            fragment: format!("({})", fragments.join(separator)),
            args,
        })
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn args(&self) -> &[SqlValue] {
        &self.args
    }
}

/// A complete statement with PostgreSQL `$n` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<SqlValue>,
}

/// Accumulates predicates and renders them into statements
#[derive(Debug, Clone, Default)]
pub struct PredicateBuilder {
    predicates: Vec<Predicate>,
}

impl PredicateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, predicate: Predicate) -> &mut Self {
        self.predicates.push(predicate);
        self
    }

    /// Push the predicate if there is one
    pub fn push_opt(&mut self, predicate: Option<Predicate>) -> &mut Self {
        if let Some(p) = predicate {
            self.predicates.push(p);
        }
        self
    }

    pub fn extend(&mut self, predicates: impl IntoIterator<Item = Predicate>) -> &mut Self {
        self.predicates.extend(predicates);
        self
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// `head WHERE <conditions joined by AND> tail`
    pub fn build(&self, head: &str, tail: &str) -> Statement {
        let conditions = if self.predicates.is_empty() {
            "TRUE".to_string()
        } else {
            self.predicates
                .iter()
                .map(|p| p.fragment.as_str())
                .collect::<Vec<_>>()
                .join(" AND ")
        };

        let args: Vec<SqlValue> = self
            .predicates
            .iter()
            .flat_map(|p| p.args.iter().cloned())
            .collect();

        let mut sql = String::with_capacity(head.len() + conditions.len() + tail.len() + 8);
        sql.push_str(head);
        sql.push_str(" WHERE ");
        sql.push_str(&number_placeholders(&conditions));
        if !tail.is_empty() {
            sql.push(' ');
            sql.push_str(tail);
        }

        Statement { sql, args }
    }

    /// `SELECT COUNT(DISTINCT key) AS total FROM table WHERE ...` over the same conditions
    pub fn build_count(&self, table: &str, key: &str) -> Statement {
        self.build(&format!("SELECT COUNT(DISTINCT {}) AS total FROM {}", key, table), "")
    }
}

fn number_placeholders(conditions: &str) -> String {
    let mut out = String::with_capacity(conditions.len() + 16);
    let mut position = 0;
    for ch in conditions.chars() {
        if ch == '?' {
            position += 1;
            out.push('$');
            out.push_str(&position.to_string());
        } else {
            out.push(ch);
        }
    }
    out
}
