//! `replica init --source <dir> --replica <dir> [--log <file>] [--interval <secs>]`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use replica_core::config;

use super::home_dir;

/// Store the mirror configuration in ~/.replica/config.yaml.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to mirror from.
    #[arg(long, short = 's')]
    pub source: PathBuf,

    /// Directory kept identical to the source.
    #[arg(long, short = 'r')]
    pub replica: PathBuf,

    /// Event log file. Defaults to ~/.replica/logs/replica.log.
    #[arg(long, short = 'l')]
    pub log: Option<PathBuf>,

    /// Seconds between automatic passes. Omit for manual passes only.
    #[arg(long, short = 'i', value_name = "SECS")]
    pub interval: Option<u64>,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let source = absolute(&self.source)?;
        let replica = absolute(&self.replica)?;
        let log = self.log.as_deref().map(absolute).transpose()?;

        let mirror = config::init_at(&home, source, replica, log, self.interval)
            .context("failed to store mirror configuration")?;

        println!(
            "{} Mirroring {} → {}",
            "✓".green().bold(),
            mirror.source.display(),
            mirror.replica.display()
        );
        println!("  Event log: {}", mirror.log_file.display());
        match mirror.interval_secs {
            Some(secs) => println!("  Interval:  every {secs}s"),
            None => println!("  Interval:  manual (run `replica sync`)"),
        }
        println!("  Saved to:  ~/.replica/config.yaml");
        Ok(())
    }
}

/// Anchor a relative path at the current directory without requiring it to
/// exist yet.
fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    Ok(cwd.join(path))
}
