//! Shape contract shared by every storable record.
//!
//! # Responsibility
//! - Define the identity + timestamp contract the generic repository relies on.
//! - Stay storage-agnostic; column mapping lives in `repo::table`.
//!
//! # Invariants
//! - `id()` is stable for the lifetime of a record and unique per table.
//! - Persistence identity is `id()` equality only, never structural equality.
//! - `created_at()` is fixed at construction.

use chrono::{DateTime, Utc};
use std::fmt::{Debug, Display};

/// Contract every storable record satisfies.
pub trait Entity: Clone {
    /// Identity type, assigned by the caller before insert.
    type Key: Clone + Eq + Debug + Display;

    fn id(&self) -> &Self::Key;

    fn created_at(&self) -> DateTime<Utc>;

    fn updated_at(&self) -> DateTime<Utc>;
}
