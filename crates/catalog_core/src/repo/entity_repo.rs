//! Generic entity repository contract and its SQLite implementation.
//!
//! # Responsibility
//! - Give every `Table` entity the same exists/get/list/insert/update/delete
//!   operations with caller-selected relation expansion.
//! - Keep SQL text generation inside the repository boundary.
//!
//! # Invariants
//! - Not-found is a value (`None`/`false`), never an error.
//! - Every write runs in its own transaction; a failed or interrupted write
//!   leaves no partial rows behind.
//! - `update` copies scalar columns only, never `id` or `created_at`, and
//!   always moves `updated_at` to the write time.
//! - The session tracking cache is cleared after every `update`, whatever
//!   its outcome.
//! - Reads never attach rows to the tracking cache.

use crate::repo::error::{RepoError, RepoResult};
use crate::repo::predicate::Predicate;
use crate::repo::session::{ColumnValues, Session};
use crate::repo::table::{insert_values, load_where, nanos_value, prepare, Column, Table};
use chrono::Utc;
use log::{debug, error};
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use std::marker::PhantomData;
use std::time::Instant;

/// Uniform data access for one entity type.
pub trait Repository<E: Table> {
    /// Returns whether at least one row satisfies `predicate`.
    fn exists(&self, predicate: &Predicate<E::Column>) -> RepoResult<bool>;

    /// Loads one entity by key, expanding each selector in `expand`.
    fn get(&self, key: &E::Key, expand: &[E::Relation]) -> RepoResult<Option<E>>;

    /// Loads every entity in insertion order, expanding each selector.
    fn list(&self, expand: &[E::Relation]) -> RepoResult<Vec<E>>;

    /// Inserts `entity` (and the children it owns) and commits.
    fn insert(&self, entity: &E) -> RepoResult<()>;

    /// Replaces the stored scalar columns with those of `entity`.
    ///
    /// Returns `false` when no row has `entity.id()`.
    fn update(&self, entity: &E, expand: &[E::Relation]) -> RepoResult<bool>;

    /// Removes the row with `key`. Returns `false` when it does not exist.
    fn delete(&self, key: &E::Key) -> RepoResult<bool>;
}

/// SQLite-backed repository borrowing a unit-of-work session.
pub struct SqliteRepository<'s, E> {
    session: &'s Session,
    _entity: PhantomData<fn() -> E>,
}

impl<'s, E: Table> SqliteRepository<'s, E> {
    pub fn new(session: &'s Session) -> Self {
        Self {
            session,
            _entity: PhantomData,
        }
    }

    pub fn session(&self) -> &'s Session {
        self.session
    }

    fn expand_all(&self, entities: &mut [E], expand: &[E::Relation]) -> RepoResult<()> {
        if entities.is_empty() {
            return Ok(());
        }
        for relation in expand {
            E::expand(self.session.connection(), entities, *relation)?;
        }
        Ok(())
    }

    fn persist_update(&self, entity: &E, tracked_key: &str) -> RepoResult<usize> {
        let written_at = nanos_value(Utc::now(), E::TABLE, E::Column::UPDATED_AT.name())?;
        let proposed: ColumnValues = entity
            .scalar_values()?
            .into_iter()
            .filter(|(column, _)| {
                *column != E::Column::ID
                    && *column != E::Column::CREATED_AT
                    && *column != E::Column::UPDATED_AT
            })
            .map(|(column, value)| (column.name(), value))
            .collect();

        let mut changes = self
            .session
            .modified_columns(E::TABLE, tracked_key, proposed);
        changes.push((E::Column::UPDATED_AT.name(), written_at));

        let assignments = changes
            .iter()
            .map(|(name, _)| format!("{name} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE {} = ?",
            E::TABLE,
            E::Column::ID.name()
        );
        let binds = changes
            .into_iter()
            .map(|(_, value)| value)
            .chain(std::iter::once(E::key_value(entity.id())));

        let tx = self.session.connection().unchecked_transaction()?;
        let affected = prepare(&tx, &sql)?.execute(params_from_iter(binds))?;
        tx.commit()?;
        Ok(affected)
    }
}

impl<E: Table> Repository<E> for SqliteRepository<'_, E> {
    fn exists(&self, predicate: &Predicate<E::Column>) -> RepoResult<bool> {
        let mut sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE ", E::TABLE);
        let mut binds: Vec<Value> = Vec::new();
        predicate.write_sql(&mut sql, &mut binds);
        sql.push_str(");");

        let mut stmt = prepare(self.session.connection(), &sql)?;
        let exists: i64 = stmt.query_row(params_from_iter(binds), |row| row.get(0))?;
        Ok(exists == 1)
    }

    fn get(&self, key: &E::Key, expand: &[E::Relation]) -> RepoResult<Option<E>> {
        let mut found =
            load_where::<E>(self.session.connection(), &E::key_predicate(key), Some(2))?;
        if found.len() > 1 {
            return Err(RepoError::AmbiguousKey {
                table: E::TABLE,
                key: key.to_string(),
            });
        }

        self.expand_all(&mut found, expand)?;
        Ok(found.pop())
    }

    fn list(&self, expand: &[E::Relation]) -> RepoResult<Vec<E>> {
        let mut entities = load_where::<E>(self.session.connection(), &Predicate::True, None)?;
        self.expand_all(&mut entities, expand)?;
        Ok(entities)
    }

    fn insert(&self, entity: &E) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = (|| -> RepoResult<()> {
            let tx = self.session.connection().unchecked_transaction()?;
            insert_values::<E>(&tx, entity.scalar_values()?)?;
            E::insert_owned(&tx, entity)?;
            tx.commit()?;
            Ok(())
        })();

        match &result {
            Ok(()) => debug!(
                "event=repo_insert module=repo status=ok table={} key={} duration_ms={}",
                E::TABLE,
                entity.id(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=repo_insert module=repo status=error table={} key={} duration_ms={} error={}",
                E::TABLE,
                entity.id(),
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn update(&self, entity: &E, expand: &[E::Relation]) -> RepoResult<bool> {
        let started_at = Instant::now();
        let Some(current) = self.get(entity.id(), expand)? else {
            debug!(
                "event=repo_update module=repo status=not_found table={} key={}",
                E::TABLE,
                entity.id()
            );
            return Ok(false);
        };

        let tracked_key = entity.id().to_string();
        let original = current
            .scalar_values()?
            .into_iter()
            .map(|(column, value)| (column.name(), value))
            .collect();
        self.session.attach(E::TABLE, tracked_key.clone(), original);

        let result = self.persist_update(entity, &tracked_key);
        self.session.clear_tracking();

        match result {
            Ok(affected) => {
                debug!(
                    "event=repo_update module=repo status=ok table={} key={} affected={} duration_ms={}",
                    E::TABLE,
                    entity.id(),
                    affected,
                    started_at.elapsed().as_millis()
                );
                Ok(affected > 0)
            }
            Err(err) => {
                error!(
                    "event=repo_update module=repo status=error table={} key={} duration_ms={} error={}",
                    E::TABLE,
                    entity.id(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn delete(&self, key: &E::Key) -> RepoResult<bool> {
        let started_at = Instant::now();
        if self.get(key, &[])?.is_none() {
            debug!(
                "event=repo_delete module=repo status=not_found table={} key={}",
                E::TABLE,
                key
            );
            return Ok(false);
        }

        let sql = format!("DELETE FROM {} WHERE {} = ?1", E::TABLE, E::Column::ID.name());
        let result = (|| -> RepoResult<usize> {
            let tx = self.session.connection().unchecked_transaction()?;
            let removed = prepare(&tx, &sql)?.execute([E::key_value(key)])?;
            tx.commit()?;
            Ok(removed)
        })();

        match result {
            Ok(removed) => {
                debug!(
                    "event=repo_delete module=repo status=ok table={} key={} removed={} duration_ms={}",
                    E::TABLE,
                    key,
                    removed,
                    started_at.elapsed().as_millis()
                );
                Ok(removed == 1)
            }
            Err(err) => {
                error!(
                    "event=repo_delete module=repo status=error table={} key={} duration_ms={} error={}",
                    E::TABLE,
                    key,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}
