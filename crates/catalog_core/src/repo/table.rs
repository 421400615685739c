//! Per-entity table mapping consumed by the generic repository.
//!
//! # Responsibility
//! - Describe how an entity maps onto one SQLite table: columns, row codec,
//!   relation expansion and owned-children insert.
//! - Provide the shared SQL helpers and value codecs the mappings use.
//!
//! # Invariants
//! - `Column::all()` lists every scalar column, `ID` first.
//! - Reads return rows in insertion (`rowid`) order.
//! - Expansion replaces a relation's contents; it never appends.

use crate::model::entity::Entity;
use crate::repo::error::{sqlite_code, RepoError, RepoResult};
use crate::repo::predicate::Predicate;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, CachedStatement, Connection, ErrorCode, Row};
use std::fmt::Debug;
use uuid::Uuid;

/// SQLite's historical bound-parameter limit, kept as the `IN (...)` chunk size.
const IN_CHUNK_SIZE: usize = 500;

/// Scalar column of one table.
pub trait Column: Copy + Eq + Debug + 'static {
    const ID: Self;
    const CREATED_AT: Self;
    const UPDATED_AT: Self;

    fn name(self) -> &'static str;

    fn all() -> &'static [Self];
}

/// Storage mapping for one entity type.
pub trait Table: Entity + Sized {
    const TABLE: &'static str;

    type Column: Column;

    /// Relation selector accepted by `get`/`list`/`update`.
    type Relation: Copy + Eq + Debug;

    fn key_value(key: &Self::Key) -> Value;

    /// Every scalar column with its bound value; relations are excluded.
    /// Values the store cannot hold exactly are rejected as `InvalidData`.
    fn scalar_values(&self) -> RepoResult<Vec<(Self::Column, Value)>>;

    fn from_row(row: &Row<'_>) -> RepoResult<Self>;

    /// Loads `relation` for every entity in `entities` with batched queries.
    fn expand(
        conn: &Connection,
        entities: &mut [Self],
        relation: Self::Relation,
    ) -> RepoResult<()>;

    /// Inserts children owned by `entity` inside the caller's transaction.
    fn insert_owned(_conn: &Connection, _entity: &Self) -> RepoResult<()> {
        Ok(())
    }

    fn key_predicate(key: &Self::Key) -> Predicate<Self::Column> {
        Predicate::eq(Self::Column::ID, Self::key_value(key))
    }
}

/// Prepares (and caches) a statement, reporting compile failures as
/// `RepoError::Translation`.
pub(crate) fn prepare<'c>(conn: &'c Connection, sql: &str) -> RepoResult<CachedStatement<'c>> {
    conn.prepare_cached(sql)
        .map_err(|err| match sqlite_code(&err) {
            Some(ErrorCode::Unknown) => RepoError::Translation {
                sql: sql.to_string(),
                source: err,
            },
            _ => RepoError::from(err),
        })
}

fn select_sql<T: Table>() -> String {
    let columns = T::Column::all()
        .iter()
        .map(|column| column.name())
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT {columns} FROM {}", T::TABLE)
}

/// Loads rows matching `predicate` in insertion order.
pub(crate) fn load_where<T: Table>(
    conn: &Connection,
    predicate: &Predicate<T::Column>,
    limit: Option<u32>,
) -> RepoResult<Vec<T>> {
    let mut sql = select_sql::<T>();
    let mut binds = Vec::new();
    sql.push_str(" WHERE ");
    predicate.write_sql(&mut sql, &mut binds);
    sql.push_str(" ORDER BY rowid ASC");
    if let Some(limit) = limit {
        sql.push_str(" LIMIT ?");
        binds.push(Value::Integer(i64::from(limit)));
    }

    let mut stmt = prepare(conn, &sql)?;
    let mut rows = stmt.query(params_from_iter(binds))?;
    let mut entities = Vec::new();
    while let Some(row) = rows.next()? {
        entities.push(T::from_row(row)?);
    }
    Ok(entities)
}

/// Loads rows whose `column` is one of `values`, chunking large key sets.
pub(crate) fn load_in<T: Table>(
    conn: &Connection,
    column: T::Column,
    values: Vec<Value>,
) -> RepoResult<Vec<T>> {
    let mut entities = Vec::new();
    for chunk in values.chunks(IN_CHUNK_SIZE) {
        let predicate = Predicate::in_values(column, chunk.iter().cloned());
        entities.extend(load_where::<T>(conn, &predicate, None)?);
    }
    Ok(entities)
}

/// Inserts one row built from `(column, value)` pairs.
pub(crate) fn insert_values<T: Table>(
    conn: &Connection,
    values: Vec<(T::Column, Value)>,
) -> RepoResult<usize> {
    let columns = values
        .iter()
        .map(|(column, _)| column.name())
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; values.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({columns}) VALUES ({placeholders})",
        T::TABLE
    );

    let mut stmt = prepare(conn, &sql)?;
    let inserted = stmt.execute(params_from_iter(values.into_iter().map(|(_, value)| value)))?;
    Ok(inserted)
}

pub(crate) fn uuid_value(id: &Uuid) -> Value {
    Value::Text(id.to_string())
}

pub(crate) fn parse_uuid(row: &Row<'_>, table: &str, column: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{text}` in {table}.{column}"))
    })
}

/// Timestamps are stored as nanoseconds since the Unix epoch.
pub(crate) fn nanos_value(at: DateTime<Utc>, table: &str, column: &str) -> RepoResult<Value> {
    at.timestamp_nanos_opt().map(Value::Integer).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "timestamp `{}` outside the storable range for {table}.{column}",
            at.to_rfc3339()
        ))
    })
}

pub(crate) fn parse_nanos(row: &Row<'_>, table: &str, column: &str) -> RepoResult<DateTime<Utc>> {
    let nanos: i64 = row.get(column)?;
    Ok(DateTime::from_timestamp_nanos(nanos))
}

pub(crate) fn date_value(date: NaiveDate) -> Value {
    Value::Text(date.format("%Y-%m-%d").to_string())
}

pub(crate) fn parse_date(row: &Row<'_>, table: &str, column: &str) -> RepoResult<NaiveDate> {
    let text: String = row.get(column)?;
    NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|_| {
        RepoError::InvalidData(format!("invalid date `{text}` in {table}.{column}"))
    })
}
