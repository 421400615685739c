//! Repository error taxonomy.
//!
//! Not-found is never an error here: reads return `None` and writes return
//! `false`. Everything below is fatal for the calling operation and is never
//! retried by the repository.

use crate::db::DbError;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    /// Transport or bootstrap failure from the store.
    Db(DbError),
    /// Store rejected a write: duplicate key, unique index or foreign key.
    Constraint(rusqlite::Error),
    /// Store could not compile a generated statement.
    Translation {
        sql: String,
        source: rusqlite::Error,
    },
    /// Statement was interrupted through the session interrupt handle.
    Cancelled,
    /// More than one row matched a key lookup.
    AmbiguousKey { table: &'static str, key: String },
    /// Persisted row cannot be decoded into its entity, or an entity value
    /// has no exact stored form.
    InvalidData(String),
}

impl RepoError {
    /// Returns whether the store rejected the write on a constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Constraint(err) => write!(f, "constraint violation: {err}"),
            Self::Translation { sql, source } => {
                write!(f, "store cannot execute `{sql}`: {source}")
            }
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::AmbiguousKey { table, key } => {
                write!(f, "more than one row in `{table}` matches key {key}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Constraint(err) => Some(err),
            Self::Translation { source, .. } => Some(source),
            Self::Cancelled | Self::AmbiguousKey { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

/// Primary SQLite code of `err`, including statements rejected at compile
/// time, which rusqlite reports without a code of their own.
pub(crate) fn sqlite_code(err: &rusqlite::Error) -> Option<ErrorCode> {
    match err {
        rusqlite::Error::SqlInputError { error, .. } => Some(error.code),
        other => other.sqlite_error_code(),
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match sqlite_code(&value) {
            Some(ErrorCode::ConstraintViolation) => Self::Constraint(value),
            Some(ErrorCode::OperationInterrupted) => Self::Cancelled,
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}
