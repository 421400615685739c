//! Catalog CLI
//!
//! Command-line access to albums and tracks stored in a catalog database.
//! Results are printed to stdout as JSON; failures go to stderr with exit
//! code 1.

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "catalog")]
#[command(about = "Music catalog - albums and tracks", version, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: commands::GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Album operations
    Album(commands::album::AlbumArgs),
    /// Track operations
    Track(commands::track::TrackArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Album(args) => commands::album::execute(&cli.global, args),
        Commands::Track(args) => commands::track::execute(&cli.global, args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
