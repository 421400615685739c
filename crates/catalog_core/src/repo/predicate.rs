//! Typed filter descriptors for repository reads.
//!
//! # Responsibility
//! - Describe row filters as plain data (column + operator + value) so the
//!   store can translate them without running caller code.
//! - Compile descriptors into parameterized SQL.
//!
//! # Invariants
//! - Columns come from the entity's own column enum, so a predicate cannot
//!   reference a column its table lacks.
//! - Values are always bound, never spliced into SQL text.
//! - Empty `And` is true; empty `Or` and empty `In` are false.

use crate::repo::table::Column;
use rusqlite::types::Value;
use std::ops::Not;

/// Comparison operator for a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// Boolean filter over the columns `C` of one table.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate<C> {
    True,
    Compare {
        column: C,
        op: CompareOp,
        value: Value,
    },
    IsNull(C),
    In(C, Vec<Value>),
    And(Vec<Predicate<C>>),
    Or(Vec<Predicate<C>>),
    Not(Box<Predicate<C>>),
}

impl<C: Column> Predicate<C> {
    pub fn compare(column: C, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Compare {
            column,
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: C, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    pub fn ne(column: C, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Ne, value)
    }

    pub fn lt(column: C, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Lt, value)
    }

    pub fn le(column: C, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Le, value)
    }

    pub fn gt(column: C, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Gt, value)
    }

    pub fn ge(column: C, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Ge, value)
    }

    pub fn is_null(column: C) -> Self {
        Self::IsNull(column)
    }

    pub fn in_values<V: Into<Value>>(column: C, values: impl IntoIterator<Item = V>) -> Self {
        Self::In(column, values.into_iter().map(Into::into).collect())
    }

    /// Conjunction; nested `And`s are flattened.
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::True, other) | (other, Self::True) => other,
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), other) => {
                left.push(other);
                Self::And(left)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }

    /// Disjunction; nested `Or`s are flattened.
    pub fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), other) => {
                left.push(other);
                Self::Or(left)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }

    /// Appends this predicate as a SQL boolean expression.
    pub(crate) fn write_sql(&self, sql: &mut String, binds: &mut Vec<Value>) {
        match self {
            Self::True => sql.push_str("1 = 1"),
            Self::Compare { column, op, value } => {
                sql.push_str(column.name());
                sql.push(' ');
                sql.push_str(op.as_sql());
                sql.push_str(" ?");
                binds.push(value.clone());
            }
            Self::IsNull(column) => {
                sql.push_str(column.name());
                sql.push_str(" IS NULL");
            }
            Self::In(_, values) if values.is_empty() => sql.push_str("1 = 0"),
            Self::In(column, values) => {
                sql.push_str(column.name());
                sql.push_str(" IN (");
                sql.push_str(&vec!["?"; values.len()].join(", "));
                sql.push(')');
                binds.extend(values.iter().cloned());
            }
            Self::And(parts) => write_group(parts, " AND ", "1 = 1", sql, binds),
            Self::Or(parts) => write_group(parts, " OR ", "1 = 0", sql, binds),
            Self::Not(inner) => {
                sql.push_str("NOT (");
                inner.write_sql(sql, binds);
                sql.push(')');
            }
        }
    }
}

impl<C: Column> Not for Predicate<C> {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}

fn write_group<C: Column>(
    parts: &[Predicate<C>],
    joiner: &str,
    empty: &str,
    sql: &mut String,
    binds: &mut Vec<Value>,
) {
    if parts.is_empty() {
        sql.push_str(empty);
        return;
    }
    sql.push('(');
    for (index, part) in parts.iter().enumerate() {
        if index > 0 {
            sql.push_str(joiner);
        }
        part.write_sql(sql, binds);
    }
    sql.push(')');
}

/// Convenience conversion for text comparisons.
pub fn text(value: impl Into<String>) -> Value {
    Value::Text(value.into())
}
