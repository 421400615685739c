//! Album commands

use super::{open_session, print_json, CliResult, GlobalArgs};
use catalog_core::service::album_service::{
    CreateAlbumRequest, CreateAlbumTrackRequest, UpdateAlbumRequest,
};
use catalog_core::{Album, AlbumId, AlbumService, SqliteRepository};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use log::info;
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Args)]
pub struct AlbumArgs {
    #[command(subcommand)]
    pub command: AlbumCommand,
}

#[derive(Debug, Subcommand)]
pub enum AlbumCommand {
    /// List every album (without tracks)
    List,
    /// Show one album with its tracks
    Get { id: AlbumId },
    /// Create an album with at least one track
    Create(CreateArgs),
    /// Replace title, artist and release date
    Update(UpdateArgs),
    /// Delete an album and its tracks
    Delete { id: AlbumId },
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub artist: String,

    /// Release date as YYYY-MM-DD
    #[arg(long)]
    pub release_date: NaiveDate,

    /// Track line; repeat for each track
    #[arg(long = "track", num_args = 3, value_names = ["TITLE", "DURATION", "ISRC"])]
    pub tracks: Vec<String>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    pub id: AlbumId,

    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub artist: String,

    /// Release date as YYYY-MM-DD
    #[arg(long)]
    pub release_date: NaiveDate,
}

#[derive(Debug, Serialize)]
struct Created {
    id: AlbumId,
}

#[derive(Debug, Serialize)]
struct Deleted {
    id: AlbumId,
    deleted: bool,
}

pub fn execute(global: &GlobalArgs, args: AlbumArgs) -> CliResult {
    let started_at = Instant::now();
    let session = open_session(global)?;
    let service = AlbumService::new(SqliteRepository::<Album>::new(&session));

    let command = command_name(&args.command);
    match args.command {
        AlbumCommand::List => print_json(&service.list()?)?,
        AlbumCommand::Get { id } => match service.get(&id)? {
            Some(album) => print_json(&album)?,
            None => return Err(format!("album {id} not found").into()),
        },
        AlbumCommand::Create(create) => {
            let request = CreateAlbumRequest {
                title: create.title,
                artist: create.artist,
                release_date: create.release_date,
                tracks: track_lines(create.tracks),
            };
            let id = service.create(&request)?;
            print_json(&Created { id })?;
        }
        AlbumCommand::Update(update) => {
            let request = UpdateAlbumRequest {
                title: update.title,
                artist: update.artist,
                release_date: update.release_date,
            };
            if !service.update(update.id, &request)? {
                return Err(format!("album {} not found", update.id).into());
            }
            print_json(&service.get(&update.id)?)?;
        }
        AlbumCommand::Delete { id } => {
            let deleted = service.delete(&id)?;
            print_json(&Deleted { id, deleted })?;
        }
    }

    info!(
        "event=cli_command module=cli status=ok command=album_{} duration_ms={}",
        command,
        started_at.elapsed().as_millis()
    );
    Ok(())
}

fn command_name(command: &AlbumCommand) -> &'static str {
    match command {
        AlbumCommand::List => "list",
        AlbumCommand::Get { .. } => "get",
        AlbumCommand::Create(_) => "create",
        AlbumCommand::Update(_) => "update",
        AlbumCommand::Delete { .. } => "delete",
    }
}

/// Groups flat `--track TITLE DURATION ISRC` values into request lines.
fn track_lines(values: Vec<String>) -> Vec<CreateAlbumTrackRequest> {
    let mut values = values.into_iter();
    let mut lines = Vec::new();
    while let (Some(title), Some(duration), Some(isrc)) =
        (values.next(), values.next(), values.next())
    {
        lines.push(CreateAlbumTrackRequest {
            title,
            duration,
            isrc,
        });
    }
    lines
}
