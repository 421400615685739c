//! Catalog domain model.
//!
//! # Responsibility
//! - Define the entity contract and the concrete album/track records.
//!
//! # Invariants
//! - Every record is identified by a stable, caller-assigned key.
//! - Deletion is a hard delete; there are no tombstones.

pub mod album;
pub mod entity;
pub mod track;
