//! Core of the music catalog: entities, the generic SQLite repository and
//! the album/track use-case services.
//! This crate is the single source of truth for catalog invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{CatalogConfig, ConfigError, DatabaseConfig, LoggingConfig};
pub use db::{DbError, DbResult};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::album::{Album, AlbumId};
pub use model::entity::Entity;
pub use model::track::{Track, TrackId};
pub use repo::album_table::{AlbumColumn, AlbumRelation};
pub use repo::entity_repo::{Repository, SqliteRepository};
pub use repo::error::{RepoError, RepoResult};
pub use repo::predicate::{CompareOp, Predicate};
pub use repo::session::Session;
pub use repo::track_table::{TrackColumn, TrackRelation};
pub use service::album_service::AlbumService;
pub use service::track_service::TrackService;
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
