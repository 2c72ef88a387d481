//! `replica sync`: one pass over the configured (or prompted) mirror.

use std::io;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use replica_sync::{pipeline, PassReport, Synchronizer};

use super::{home_dir, resolve_mirror, PathOverrides};

/// Arguments for `replica sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub paths: PathOverrides,

    /// Print the pass report as JSON instead of echoing events.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let mirror =
            resolve_mirror(&home, self.paths, &mut io::stdin().lock(), &mut io::stdout())?;

        let mut synchronizer = Synchronizer::new(pipeline::event_log_for(&mirror, !self.json));
        let report = pipeline::run(&mirror, &mut synchronizer).with_context(|| {
            format!(
                "synchronization of {} aborted",
                mirror.replica.display()
            )
        })?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize pass report")?
            );
        } else {
            print_summary(&report);
        }
        Ok(())
    }
}

fn print_summary(report: &PassReport) {
    let specials = report.special_files + report.applied.specials_skipped;
    if !report.has_changes() && report.kind_mismatches + report.listing_errors + specials == 0 {
        println!("{} replica already up to date", "✓".green().bold());
        return;
    }

    println!(
        "{} pass finished: {} added, {} deleted, {} modified ({} folders, {}ms)",
        "✓".green().bold(),
        report.created,
        report.deleted,
        report.modified,
        report.levels,
        report.duration_ms
    );
    if report.kind_mismatches > 0 {
        println!(
            "  {} {} entries differ in kind and were left alone",
            "!".yellow().bold(),
            report.kind_mismatches
        );
    }
    if specials > 0 {
        println!(
            "  {} {} special files were skipped",
            "!".yellow().bold(),
            specials
        );
    }
    if report.listing_errors > 0 {
        println!(
            "  {} {} folders could not be read",
            "!".yellow().bold(),
            report.listing_errors
        );
    }
}
