//! Track commands

use super::{open_session, print_json, CliResult, GlobalArgs};
use catalog_core::service::track_service::SaveTrackRequest;
use catalog_core::{AlbumId, SqliteRepository, Track, TrackId, TrackService};
use clap::{Args, Subcommand};
use log::info;
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Args)]
pub struct TrackArgs {
    #[command(subcommand)]
    pub command: TrackCommand,
}

#[derive(Debug, Subcommand)]
pub enum TrackCommand {
    /// List every track ordered by album title
    List,
    /// Show one track
    Get { id: TrackId },
    /// Add a track to an existing album
    Create(SaveArgs),
    /// Replace every field of a track
    Update {
        id: TrackId,
        #[command(flatten)]
        fields: SaveArgs,
    },
    /// Delete a track
    Delete { id: TrackId },
}

#[derive(Debug, Args)]
pub struct SaveArgs {
    #[arg(long)]
    pub album: AlbumId,

    #[arg(long)]
    pub title: String,

    /// Duration as hh:mm:ss or mm:ss
    #[arg(long)]
    pub duration: String,

    #[arg(long)]
    pub isrc: String,
}

impl From<SaveArgs> for SaveTrackRequest {
    fn from(args: SaveArgs) -> Self {
        Self {
            album_id: args.album,
            title: args.title,
            duration: args.duration,
            isrc: args.isrc,
        }
    }
}

#[derive(Debug, Serialize)]
struct Created {
    id: TrackId,
}

#[derive(Debug, Serialize)]
struct Deleted {
    id: TrackId,
    deleted: bool,
}

pub fn execute(global: &GlobalArgs, args: TrackArgs) -> CliResult {
    let started_at = Instant::now();
    let session = open_session(global)?;
    let service = TrackService::new(SqliteRepository::<Track>::new(&session));

    let command = match &args.command {
        TrackCommand::List => "list",
        TrackCommand::Get { .. } => "get",
        TrackCommand::Create(_) => "create",
        TrackCommand::Update { .. } => "update",
        TrackCommand::Delete { .. } => "delete",
    };
    match args.command {
        TrackCommand::List => print_json(&service.list()?)?,
        TrackCommand::Get { id } => match service.get(&id)? {
            Some(track) => print_json(&track)?,
            None => return Err(format!("track {id} not found").into()),
        },
        TrackCommand::Create(fields) => {
            let id = service.create(&SaveTrackRequest::from(fields))?;
            print_json(&Created { id })?;
        }
        TrackCommand::Update { id, fields } => {
            if !service.update(id, &SaveTrackRequest::from(fields))? {
                return Err(format!("track {id} not found").into());
            }
            print_json(&service.get(&id)?)?;
        }
        TrackCommand::Delete { id } => {
            let deleted = service.delete(&id)?;
            print_json(&Deleted { id, deleted })?;
        }
    }

    info!(
        "event=cli_command module=cli status=ok command=track_{} duration_ms={}",
        command,
        started_at.elapsed().as_millis()
    );
    Ok(())
}
