//! Album use-case service.
//!
//! # Responsibility
//! - Create albums together with their initial tracks.
//! - Expose album reads as `AlbumResponse` projections.
//!
//! # Invariants
//! - `create` assigns fresh time-ordered IDs to the album and every track.
//! - `update` replaces album scalars only; existing tracks are untouched.

use crate::model::album::{Album, AlbumId};
use crate::model::track::{format_duration, Track};
use crate::repo::album_table::AlbumRelation;
use crate::repo::entity_repo::Repository;
use crate::service::validation::{Validator, MAX_ARTIST_CHARS, MAX_TITLE_CHARS};
use crate::service::{today_utc, ServiceResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Track line inside a create-album request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateAlbumTrackRequest {
    pub title: String,
    /// `hh:mm:ss` or `mm:ss`.
    pub duration: String,
    pub isrc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateAlbumRequest {
    pub title: String,
    pub artist: String,
    pub release_date: NaiveDate,
    pub tracks: Vec<CreateAlbumTrackRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateAlbumRequest {
    pub title: String,
    pub artist: String,
    pub release_date: NaiveDate,
}

/// Album read projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumResponse {
    pub id: AlbumId,
    pub title: String,
    pub artist: String,
    pub release_date: NaiveDate,
    /// Empty for list results, which do not expand tracks.
    pub tracks: Vec<AlbumTrackResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumTrackResponse {
    /// 1-based position on the album.
    pub number: usize,
    pub title: String,
    pub duration: String,
}

impl From<Album> for AlbumResponse {
    fn from(album: Album) -> Self {
        let tracks = album
            .tracks
            .iter()
            .enumerate()
            .map(|(index, track)| AlbumTrackResponse {
                number: index + 1,
                title: track.title.clone(),
                duration: format_duration(track.duration),
            })
            .collect();
        Self {
            id: album.id,
            title: album.title,
            artist: album.artist,
            release_date: album.release_date,
            tracks,
        }
    }
}

/// Use-case service wrapper for album operations.
pub struct AlbumService<R: Repository<Album>> {
    repo: R,
}

impl<R: Repository<Album>> AlbumService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Gets one album with its tracks.
    pub fn get(&self, id: &AlbumId) -> ServiceResult<Option<AlbumResponse>> {
        let album = self.repo.get(id, &[AlbumRelation::Tracks])?;
        Ok(album.map(AlbumResponse::from))
    }

    /// Lists every album without tracks, in insertion order.
    pub fn list(&self) -> ServiceResult<Vec<AlbumResponse>> {
        let albums = self.repo.list(&[])?;
        Ok(albums.into_iter().map(AlbumResponse::from).collect())
    }

    /// Validates and inserts a new album with its tracks.
    ///
    /// Returns the generated album ID.
    pub fn create(&self, request: &CreateAlbumRequest) -> ServiceResult<AlbumId> {
        let album = build_album(request, today_utc())?;
        self.repo.insert(&album)?;
        Ok(album.id)
    }

    /// Replaces title, artist and release date of album `id`.
    ///
    /// Returns `false` when the album does not exist.
    pub fn update(&self, id: AlbumId, request: &UpdateAlbumRequest) -> ServiceResult<bool> {
        let mut validator = Validator::default();
        validator.required_text("title", &request.title, MAX_TITLE_CHARS);
        validator.required_text("artist", &request.artist, MAX_ARTIST_CHARS);
        validator.release_date("release_date", request.release_date, today_utc());
        validator.finish()?;

        let album = Album::with_id(
            id,
            request.title.as_str(),
            request.artist.as_str(),
            request.release_date,
        );
        Ok(self.repo.update(&album, &[AlbumRelation::Tracks])?)
    }

    /// Deletes album `id` and, through the store, its tracks.
    pub fn delete(&self, id: &AlbumId) -> ServiceResult<bool> {
        Ok(self.repo.delete(id)?)
    }
}

fn build_album(request: &CreateAlbumRequest, today: NaiveDate) -> ServiceResult<Album> {
    let mut validator = Validator::default();
    validator.required_text("title", &request.title, MAX_TITLE_CHARS);
    validator.required_text("artist", &request.artist, MAX_ARTIST_CHARS);
    validator.release_date("release_date", request.release_date, today);
    validator.non_empty("tracks", &request.tracks);

    let mut tracks = Vec::with_capacity(request.tracks.len());
    for (index, line) in request.tracks.iter().enumerate() {
        validator.required_text(&format!("tracks[{index}].title"), &line.title, MAX_TITLE_CHARS);
        validator.isrc(&format!("tracks[{index}].isrc"), &line.isrc);
        if let Some(duration) = validator.duration(&format!("tracks[{index}].duration"), &line.duration)
        {
            tracks.push(Track::new(
                Uuid::nil(),
                line.isrc.as_str(),
                line.title.as_str(),
                duration,
            ));
        }
    }
    validator.finish()?;

    let mut album = Album::new(
        request.title.as_str(),
        request.artist.as_str(),
        request.release_date,
    );
    for track in tracks {
        album.push_track(track);
    }
    Ok(album)
}
