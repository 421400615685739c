//! Track use-case service.
//!
//! # Responsibility
//! - Manage tracks individually after their album exists.
//! - Expose track reads joined with album title and artist.
//!
//! # Invariants
//! - `list` is ordered by album title; tracks of one album keep insertion
//!   order.
//! - A track pointing at a missing album is rejected by the store as a
//!   constraint violation.

use crate::model::album::AlbumId;
use crate::model::track::{format_duration, Track, TrackId};
use crate::repo::entity_repo::Repository;
use crate::repo::track_table::TrackRelation;
use crate::service::validation::{Validator, MAX_TITLE_CHARS};
use crate::service::ServiceResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Create and update payload for a single track.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SaveTrackRequest {
    pub album_id: AlbumId,
    pub title: String,
    /// `hh:mm:ss` or `mm:ss`.
    pub duration: String,
    pub isrc: String,
}

/// Track read projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackResponse {
    pub id: TrackId,
    pub title: String,
    /// Owning album title; empty when the album could not be loaded.
    pub album: String,
    pub artist: String,
    pub duration: String,
    pub isrc: String,
}

impl From<Track> for TrackResponse {
    fn from(track: Track) -> Self {
        let (album, artist) = match track.album {
            Some(album) => (album.title, album.artist),
            None => (String::new(), String::new()),
        };
        Self {
            id: track.id,
            title: track.title,
            album,
            artist,
            duration: format_duration(track.duration),
            isrc: track.isrc,
        }
    }
}

/// Use-case service wrapper for track operations.
pub struct TrackService<R: Repository<Track>> {
    repo: R,
}

impl<R: Repository<Track>> TrackService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Gets one track with its album.
    pub fn get(&self, id: &TrackId) -> ServiceResult<Option<TrackResponse>> {
        let track = self.repo.get(id, &[TrackRelation::Album])?;
        Ok(track.map(TrackResponse::from))
    }

    /// Lists every track with its album, ordered by album title.
    pub fn list(&self) -> ServiceResult<Vec<TrackResponse>> {
        let mut tracks = self
            .repo
            .list(&[TrackRelation::Album])?
            .into_iter()
            .map(TrackResponse::from)
            .collect::<Vec<_>>();
        tracks.sort_by(|left, right| left.album.cmp(&right.album));
        Ok(tracks)
    }

    /// Validates and inserts a new track. Returns the generated ID.
    pub fn create(&self, request: &SaveTrackRequest) -> ServiceResult<TrackId> {
        let duration = validate(request)?;
        let track = Track::new(
            request.album_id,
            request.isrc.as_str(),
            request.title.as_str(),
            duration,
        );
        self.repo.insert(&track)?;
        Ok(track.id)
    }

    /// Replaces every scalar field of track `id`, including its album.
    ///
    /// Returns `false` when the track does not exist.
    pub fn update(&self, id: TrackId, request: &SaveTrackRequest) -> ServiceResult<bool> {
        let duration = validate(request)?;
        let track = Track::with_id(
            id,
            request.album_id,
            request.isrc.as_str(),
            request.title.as_str(),
            duration,
        );
        Ok(self.repo.update(&track, &[])?)
    }

    pub fn delete(&self, id: &TrackId) -> ServiceResult<bool> {
        Ok(self.repo.delete(id)?)
    }
}

fn validate(request: &SaveTrackRequest) -> ServiceResult<Duration> {
    let mut validator = Validator::default();
    validator.album_id("album_id", &request.album_id);
    validator.required_text("title", &request.title, MAX_TITLE_CHARS);
    let duration = validator.duration("duration", &request.duration);
    validator.isrc("isrc", &request.isrc);
    validator.finish()?;
    // Some whenever `finish` succeeds.
    Ok(duration.unwrap_or_default())
}
