//! Repository layer: one generic data-access component for every entity.
//!
//! # Responsibility
//! - Define the uniform repository contract and its SQLite implementation.
//! - Map entities onto tables, typed predicates and relation selectors.
//! - Own the unit-of-work session and its tracking cache.
//!
//! # Invariants
//! - Repositories report semantic not-found as values, and store failures
//!   (constraint, translation, cancellation) as `RepoError`.
//! - No retries and no silent recovery happen at this layer.

pub mod album_table;
pub mod entity_repo;
pub mod error;
pub mod predicate;
pub mod session;
pub mod table;
pub mod track_table;
