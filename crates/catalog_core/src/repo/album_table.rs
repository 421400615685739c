//! `albums` table mapping.
//!
//! # Invariants
//! - `Tracks` expansion loads children in insertion order with one batched
//!   query per call.
//! - Inserting an album also inserts the tracks it carries, re-pointing each
//!   track's `album_id` at the album.

use crate::model::album::{Album, AlbumId};
use crate::model::track::Track;
use crate::repo::error::RepoResult;
use crate::repo::table::{
    date_value, insert_values, load_in, nanos_value, parse_date, parse_nanos, parse_uuid,
    uuid_value, Column, Table,
};
use crate::repo::track_table::TrackColumn;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlbumColumn {
    Id,
    Title,
    Artist,
    ReleaseDate,
    CreatedAt,
    UpdatedAt,
}

impl Column for AlbumColumn {
    const ID: Self = Self::Id;
    const CREATED_AT: Self = Self::CreatedAt;
    const UPDATED_AT: Self = Self::UpdatedAt;

    fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Artist => "artist",
            Self::ReleaseDate => "release_date",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }

    fn all() -> &'static [Self] {
        &[
            Self::Id,
            Self::Title,
            Self::Artist,
            Self::ReleaseDate,
            Self::CreatedAt,
            Self::UpdatedAt,
        ]
    }
}

/// Relations an album read can expand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlbumRelation {
    Tracks,
}

impl Table for Album {
    const TABLE: &'static str = "albums";

    type Column = AlbumColumn;
    type Relation = AlbumRelation;

    fn key_value(key: &AlbumId) -> Value {
        uuid_value(key)
    }

    fn scalar_values(&self) -> RepoResult<Vec<(AlbumColumn, Value)>> {
        Ok(vec![
            (AlbumColumn::Id, uuid_value(&self.id)),
            (AlbumColumn::Title, Value::Text(self.title.clone())),
            (AlbumColumn::Artist, Value::Text(self.artist.clone())),
            (AlbumColumn::ReleaseDate, date_value(self.release_date)),
            (
                AlbumColumn::CreatedAt,
                nanos_value(self.created_at, Self::TABLE, "created_at")?,
            ),
            (
                AlbumColumn::UpdatedAt,
                nanos_value(self.updated_at, Self::TABLE, "updated_at")?,
            ),
        ])
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: parse_uuid(row, Self::TABLE, "id")?,
            title: row.get("title")?,
            artist: row.get("artist")?,
            release_date: parse_date(row, Self::TABLE, "release_date")?,
            tracks: Vec::new(),
            created_at: parse_nanos(row, Self::TABLE, "created_at")?,
            updated_at: parse_nanos(row, Self::TABLE, "updated_at")?,
        })
    }

    fn expand(conn: &Connection, albums: &mut [Self], relation: AlbumRelation) -> RepoResult<()> {
        match relation {
            AlbumRelation::Tracks => {
                let keys = albums.iter().map(|album| uuid_value(&album.id)).collect();
                let mut by_album: HashMap<AlbumId, Vec<Track>> = HashMap::new();
                for track in load_in::<Track>(conn, TrackColumn::AlbumId, keys)? {
                    by_album.entry(track.album_id).or_default().push(track);
                }
                for album in albums.iter_mut() {
                    album.tracks = by_album.remove(&album.id).unwrap_or_default();
                }
            }
        }
        Ok(())
    }

    fn insert_owned(conn: &Connection, album: &Self) -> RepoResult<()> {
        for track in &album.tracks {
            let mut values = track.scalar_values()?;
            for (column, value) in values.iter_mut() {
                if *column == TrackColumn::AlbumId {
                    *value = uuid_value(&album.id);
                }
            }
            insert_values::<Track>(conn, values)?;
        }
        Ok(())
    }
}
