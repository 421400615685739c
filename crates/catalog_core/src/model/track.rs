//! Track domain model.
//!
//! # Responsibility
//! - Define the item record owned by an album.
//! - Provide `hh:mm:ss` duration formatting/parsing shared by services and CLI.
//!
//! # Invariants
//! - `album_id` references an existing album once persisted.
//! - `isrc` is unique across all tracks (enforced by the store).

use crate::model::album::{Album, AlbumId};
use crate::model::entity::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Stable identifier for tracks.
pub type TrackId = Uuid;

/// One recording on an album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub album_id: AlbumId,
    /// International Standard Recording Code.
    pub isrc: String,
    pub title: String,
    pub duration: Duration,
    /// Owning album, present only when expanded.
    pub album: Option<Box<Album>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Track {
    /// Creates a track with a generated time-ordered ID.
    ///
    /// `album_id` starts nil when the track is built as part of a new album
    /// graph; `Album::push_track` fills it in.
    pub fn new(
        album_id: AlbumId,
        isrc: impl Into<String>,
        title: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self::with_id(Uuid::now_v7(), album_id, isrc, title, duration)
    }

    pub fn with_id(
        id: TrackId,
        album_id: AlbumId,
        isrc: impl Into<String>,
        title: impl Into<String>,
        duration: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            album_id,
            isrc: isrc.into(),
            title: title.into(),
            duration,
            album: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for Track {
    type Key = TrackId;

    fn id(&self) -> &TrackId {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Formats a duration as zero-padded `hh:mm:ss`, dropping sub-second parts.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Parses `hh:mm:ss` or `mm:ss`.
///
/// Returns `None` for malformed input or out-of-range minute/second parts.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let parts = value
        .trim()
        .split(':')
        .map(|part| part.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;

    let (hours, minutes, seconds) = match parts.as_slice() {
        [hours, minutes, seconds] => (*hours, *minutes, *seconds),
        [minutes, seconds] => (0, *minutes, *seconds),
        _ => return None,
    };
    if minutes >= 60 || seconds >= 60 {
        return None;
    }

    Some(Duration::from_secs(hours * 3600 + minutes * 60 + seconds))
}
