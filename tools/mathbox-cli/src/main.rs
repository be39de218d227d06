//! Mathbox CLI - Inspect I, Robot ROM data from the command line
//!
//! # Commands
//!
//! - `mathbox meshes` - List every decodable object in the mathbox ROMs
//! - `mathbox dump` - Dump one object (or all of them) in full detail
//! - `mathbox levels` - Decode the level table and print the playfields
//!
//! # Usage
//!
//! Point the tool at a directory holding the ROM images:
//! ```bash
//! # Summarize every object
//! mathbox meshes --roms ./roms
//!
//! # Dump the object at a specific address
//! mathbox dump --roms ./roms 3892
//!
//! # Print level 12's tile grid
//! mathbox levels --roms ./roms --level 12
//! ```
//!
//! Log verbosity follows `RUST_LOG` (e.g. `RUST_LOG=mathbox=trace`).

mod dump;
mod levels;
mod meshes;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Mathbox CLI - Inspect I, Robot ROM data
#[derive(Parser)]
#[command(name = "mathbox")]
#[command(about = "Inspect I, Robot mathbox and playfield ROMs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every decodable object in the mathbox ROMs
    Meshes(meshes::MeshesArgs),

    /// Dump one object (or all of them) in full detail
    Dump(dump::DumpArgs),

    /// Decode the level table and print the playfields
    Levels(levels::LevelsArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Meshes(args) => meshes::execute(args),
        Commands::Dump(args) => dump::execute(args),
        Commands::Levels(args) => levels::execute(args),
    }
}
