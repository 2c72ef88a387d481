pub mod init;
pub mod status;
pub mod sync;
pub mod watch;

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use replica_core::{config, ConfigError, MirrorConfig};

use crate::prompt;

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}

/// Stored configuration, or `None` if `replica init` never ran.
fn load_stored(home: &Path) -> Result<Option<MirrorConfig>> {
    match config::load_at(home) {
        Ok(stored) => Ok(Some(stored)),
        Err(ConfigError::NotFound { .. }) => Ok(None),
        Err(err) => Err(err).context("failed to load ~/.replica/config.yaml"),
    }
}

/// Paths given on the command line, each overriding the stored value.
#[derive(Args, Debug, Default)]
pub struct PathOverrides {
    /// Directory to mirror from (defaults to the stored configuration).
    #[arg(long, short = 's')]
    pub source: Option<PathBuf>,

    /// Directory kept identical to the source.
    #[arg(long, short = 'r')]
    pub replica: Option<PathBuf>,

    /// Event log file.
    #[arg(long, short = 'l')]
    pub log: Option<PathBuf>,
}

/// Build the mirror to run from overrides, then the stored configuration,
/// then answers on `input`. An empty log path answer selects the default
/// event log.
pub(crate) fn resolve_mirror<R: BufRead, W: Write>(
    home: &Path,
    overrides: PathOverrides,
    input: &mut R,
    output: &mut W,
) -> Result<MirrorConfig> {
    let stored = load_stored(home)?;

    let source = match overrides
        .source
        .or_else(|| stored.as_ref().map(|c| c.source.clone()))
    {
        Some(path) => path,
        None => prompt::ask_path(input, output, "Source folder path: ")?,
    };
    let replica = match overrides
        .replica
        .or_else(|| stored.as_ref().map(|c| c.replica.clone()))
    {
        Some(path) => path,
        None => prompt::ask_path(input, output, "Replica folder path: ")?,
    };
    let log_file = match overrides
        .log
        .or_else(|| stored.as_ref().map(|c| c.log_file.clone()))
    {
        Some(path) => path,
        None => match prompt::ask(input, output, "Log File path: ")? {
            answer if answer.is_empty() => config::default_log_path_at(home),
            answer => PathBuf::from(answer),
        },
    };

    let interval_secs = stored.as_ref().and_then(|c| c.interval_secs);
    let mirror = MirrorConfig::new(source, replica, log_file, interval_secs);
    mirror.validate().context("invalid mirror configuration")?;
    Ok(mirror)
}
