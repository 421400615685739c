//! Shared command plumbing: config resolution, session opening, output.

pub mod album;
pub mod track;

use catalog_core::{init_logging_from_config, CatalogConfig, Session};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// TOML config file; defaults plus CATALOG_* environment when omitted
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overriding the configured path
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
}

/// Resolves configuration, starts logging and opens the session.
pub fn open_session(global: &GlobalArgs) -> Result<Session, Box<dyn std::error::Error>> {
    let mut config = match &global.config {
        Some(path) => CatalogConfig::load(path)?,
        None => CatalogConfig::from_env()?,
    };
    if let Some(db) = &global.db {
        config.database.path = db.clone();
        config.validate()?;
    }

    init_logging_from_config(&config.logging)?;
    Ok(Session::open(&config.database)?)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
