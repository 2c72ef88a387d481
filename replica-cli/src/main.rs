//! Replica: one-way directory mirroring.
//!
//! # Usage
//!
//! ```text
//! replica init --source <dir> --replica <dir> [--log <file>] [--interval <secs>]
//! replica sync [--source <dir>] [--replica <dir>] [--log <file>] [--json]
//! replica watch [--source <dir>] [--replica <dir>] [--log <file>] [--interval <secs>] [--passes <n>] [--log-json]
//! replica status [--json]
//! ```

mod commands;
mod prompt;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{init::InitArgs, status::StatusArgs, sync::SyncArgs, watch::WatchArgs};

#[derive(Parser, Debug)]
#[command(
    name = "replica",
    version,
    about = "Keep a replica directory identical to a source directory",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store the source, replica, event log and interval.
    Init(InitArgs),

    /// Run one synchronization pass.
    Sync(SyncArgs),

    /// Run passes repeatedly until interrupted.
    Watch(WatchArgs),

    /// Show the stored configuration and the last automatic pass.
    Status(StatusArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Sync(args) => args.run(),
        Commands::Watch(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}
