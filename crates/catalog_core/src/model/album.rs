//! Album domain model.
//!
//! # Responsibility
//! - Define the collection record that owns an ordered list of tracks.
//!
//! # Invariants
//! - `id` is stable and never reused for another album.
//! - `tracks` is only populated when explicitly expanded or when building a
//!   new album graph for insert.

use crate::model::entity::Entity;
use crate::model::track::Track;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for albums.
pub type AlbumId = Uuid;

/// A released collection of tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: AlbumId,
    pub title: String,
    pub artist: String,
    pub release_date: NaiveDate,
    /// Ordered by insertion. Empty unless expanded.
    pub tracks: Vec<Track>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Album {
    /// Creates an album with a generated time-ordered ID and no tracks.
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        release_date: NaiveDate,
    ) -> Self {
        Self::with_id(Uuid::now_v7(), title, artist, release_date)
    }

    /// Creates an album with a caller-provided ID.
    ///
    /// Both timestamps start at the same instant.
    pub fn with_id(
        id: AlbumId,
        title: impl Into<String>,
        artist: impl Into<String>,
        release_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.into(),
            artist: artist.into(),
            release_date,
            tracks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a track to the in-memory graph, pointing it at this album.
    pub fn push_track(&mut self, mut track: Track) {
        track.album_id = self.id;
        self.tracks.push(track);
    }
}

impl Entity for Album {
    type Key = AlbumId;

    fn id(&self) -> &AlbumId {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
