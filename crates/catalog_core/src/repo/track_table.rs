//! `tracks` table mapping.
//!
//! # Invariants
//! - Durations are stored as whole nanoseconds; longer ones are rejected.
//! - `Album` expansion attaches the owning album without its track list, so
//!   expansion stays single-level.

use crate::model::album::{Album, AlbumId};
use crate::model::track::{Track, TrackId};
use crate::repo::album_table::AlbumColumn;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::table::{load_in, nanos_value, parse_nanos, parse_uuid, uuid_value, Column, Table};
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackColumn {
    Id,
    AlbumId,
    Isrc,
    Title,
    DurationNs,
    CreatedAt,
    UpdatedAt,
}

impl Column for TrackColumn {
    const ID: Self = Self::Id;
    const CREATED_AT: Self = Self::CreatedAt;
    const UPDATED_AT: Self = Self::UpdatedAt;

    fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::AlbumId => "album_id",
            Self::Isrc => "isrc",
            Self::Title => "title",
            Self::DurationNs => "duration_ns",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }

    fn all() -> &'static [Self] {
        &[
            Self::Id,
            Self::AlbumId,
            Self::Isrc,
            Self::Title,
            Self::DurationNs,
            Self::CreatedAt,
            Self::UpdatedAt,
        ]
    }
}

/// Relations a track read can expand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackRelation {
    Album,
}

impl Table for Track {
    const TABLE: &'static str = "tracks";

    type Column = TrackColumn;
    type Relation = TrackRelation;

    fn key_value(key: &TrackId) -> Value {
        uuid_value(key)
    }

    fn scalar_values(&self) -> RepoResult<Vec<(TrackColumn, Value)>> {
        let duration_ns = i64::try_from(self.duration.as_nanos()).map_err(|_| {
            RepoError::InvalidData(format!(
                "duration {:?} exceeds tracks.duration_ns",
                self.duration
            ))
        })?;
        Ok(vec![
            (TrackColumn::Id, uuid_value(&self.id)),
            (TrackColumn::AlbumId, uuid_value(&self.album_id)),
            (TrackColumn::Isrc, Value::Text(self.isrc.clone())),
            (TrackColumn::Title, Value::Text(self.title.clone())),
            (TrackColumn::DurationNs, Value::Integer(duration_ns)),
            (
                TrackColumn::CreatedAt,
                nanos_value(self.created_at, Self::TABLE, "created_at")?,
            ),
            (
                TrackColumn::UpdatedAt,
                nanos_value(self.updated_at, Self::TABLE, "updated_at")?,
            ),
        ])
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let duration_ns: i64 = row.get("duration_ns")?;
        let duration_ns = u64::try_from(duration_ns).map_err(|_| {
            RepoError::InvalidData(format!(
                "negative duration `{duration_ns}` in tracks.duration_ns"
            ))
        })?;

        Ok(Self {
            id: parse_uuid(row, Self::TABLE, "id")?,
            album_id: parse_uuid(row, Self::TABLE, "album_id")?,
            isrc: row.get("isrc")?,
            title: row.get("title")?,
            duration: Duration::from_nanos(duration_ns),
            album: None,
            created_at: parse_nanos(row, Self::TABLE, "created_at")?,
            updated_at: parse_nanos(row, Self::TABLE, "updated_at")?,
        })
    }

    fn expand(conn: &Connection, tracks: &mut [Self], relation: TrackRelation) -> RepoResult<()> {
        match relation {
            TrackRelation::Album => {
                let owner_ids: BTreeSet<AlbumId> =
                    tracks.iter().map(|track| track.album_id).collect();
                let keys = owner_ids.iter().map(uuid_value).collect();
                let albums: HashMap<AlbumId, Album> = load_in::<Album>(conn, AlbumColumn::Id, keys)?
                    .into_iter()
                    .map(|album| (album.id, album))
                    .collect();
                for track in tracks.iter_mut() {
                    track.album = albums.get(&track.album_id).cloned().map(Box::new);
                }
            }
        }
        Ok(())
    }
}
