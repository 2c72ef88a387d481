//! `replica watch`: automatic passes at a fixed interval.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::Args;

use replica_core::MirrorConfig;
use replica_daemon::{init_tracing, start_blocking};

use super::{home_dir, resolve_mirror, PathOverrides};
use crate::prompt;

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub paths: PathOverrides,

    /// Seconds between passes; overrides the stored interval.
    #[arg(long, short = 'i', value_name = "SECS")]
    pub interval: Option<u64>,

    /// Stop after this many passes.
    #[arg(long, value_name = "N")]
    pub passes: Option<usize>,

    /// Emit diagnostics on stderr as JSON.
    #[arg(long)]
    pub log_json: bool,
}

impl WatchArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let mut input = io::stdin().lock();
        let mut output = io::stdout();

        let mut mirror = resolve_mirror(&home, self.paths, &mut input, &mut output)?;
        let Some(interval) = choose_interval(&mirror, self.interval, &mut input, &mut output)?
        else {
            println!("Automatic synchronization not enabled. Run `replica sync` for a single pass.");
            return Ok(());
        };
        mirror.interval_secs = Some(interval);

        init_tracing(self.log_json);
        let stats = start_blocking(&home, mirror, self.passes).context("polling driver failed")?;
        println!(
            "Stopped after {} passes ({} aborted).",
            stats.passes, stats.failed
        );
        Ok(())
    }
}

/// Interval from the flag, then the configuration, then the user.
/// `None` when the user declines automatic synchronization.
fn choose_interval<R: BufRead, W: Write>(
    mirror: &MirrorConfig,
    flag: Option<u64>,
    input: &mut R,
    output: &mut W,
) -> Result<Option<u64>> {
    if let Some(secs) = flag.or(mirror.interval_secs) {
        return Ok(Some(secs));
    }
    if !prompt::ask_yes_no(
        input,
        output,
        "Do you want to enable automatic synchronization? (y/n): ",
    )? {
        return Ok(None);
    }
    let secs = prompt::ask_seconds(
        input,
        output,
        "Enter the interval (in seconds) for automatic synchronization: ",
    )?;
    Ok(Some(secs))
}
