//! Unit-of-work session over one SQLite connection.
//!
//! # Responsibility
//! - Own the connection used by every repository of one unit of work.
//! - Hold the tracking cache that replace-by-snapshot updates diff against.
//! - Expose the interrupt handle used to cancel in-flight statements.
//!
//! # Invariants
//! - A session is `Send` but not `Sync`: one thread drives it at a time and
//!   its operations run in call order.
//! - The tracking cache is empty between repository calls.

use crate::config::DatabaseConfig;
use crate::db::{open_db, open_db_in_memory, DbResult};
use rusqlite::types::Value;
use rusqlite::{Connection, InterruptHandle};
use std::cell::RefCell;
use std::collections::HashMap;

/// Column values keyed by column name.
pub(crate) type ColumnValues = Vec<(&'static str, Value)>;

/// Row snapshots attached during a write, keyed by `(table, key)`.
#[derive(Debug, Default)]
struct ChangeTracker {
    rows: HashMap<(&'static str, String), ColumnValues>,
}

impl ChangeTracker {
    fn attach(&mut self, table: &'static str, key: String, original: ColumnValues) {
        self.rows.insert((table, key), original);
    }

    /// Returns the proposed columns whose value differs from the attached row.
    ///
    /// Every proposed column counts as modified when nothing is attached.
    fn modified(&self, table: &'static str, key: &str, proposed: ColumnValues) -> ColumnValues {
        let Some(original) = self.rows.get(&(table, key.to_string())) else {
            return proposed;
        };
        proposed
            .into_iter()
            .filter(|(column, value)| {
                original
                    .iter()
                    .find(|(name, _)| name == column)
                    .map_or(true, |(_, stored)| stored != value)
            })
            .collect()
    }
}

/// Exclusive store handle for one unit of work.
pub struct Session {
    conn: Connection,
    tracker: RefCell<ChangeTracker>,
}

impl Session {
    /// Wraps a connection that already has the catalog schema applied.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            tracker: RefCell::new(ChangeTracker::default()),
        }
    }

    /// Opens the configured database file.
    pub fn open(config: &DatabaseConfig) -> DbResult<Self> {
        open_db(&config.path, config.busy_timeout()).map(Self::new)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> DbResult<Self> {
        open_db_in_memory().map(Self::new)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Handle another thread can use to abort the statement running now.
    ///
    /// An interrupted repository call returns `RepoError::Cancelled` and its
    /// transaction is rolled back.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.conn.get_interrupt_handle()
    }

    /// Number of rows currently attached to the tracking cache.
    pub fn tracked_len(&self) -> usize {
        self.tracker.borrow().rows.len()
    }

    /// Drops every tracked row snapshot.
    pub fn clear_tracking(&self) {
        self.tracker.borrow_mut().rows.clear();
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }

    pub(crate) fn attach(&self, table: &'static str, key: String, original: ColumnValues) {
        self.tracker.borrow_mut().attach(table, key, original);
    }

    pub(crate) fn modified_columns(
        &self,
        table: &'static str,
        key: &str,
        proposed: ColumnValues,
    ) -> ColumnValues {
        self.tracker.borrow().modified(table, key, proposed)
    }
}
