//! `replica status`: stored configuration and last automatic pass.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use replica_core::MirrorConfig;
use replica_daemon::{status, LastPass};

use super::{home_dir, load_stored};

/// Arguments for `replica status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let mirror = load_stored(&home)?;
        let last_pass = status::load_at(&home).context("failed to read last pass status")?;

        if self.json {
            let payload = StatusJson {
                configured: mirror.is_some(),
                mirror: mirror.as_ref(),
                last_pass: last_pass.as_ref(),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
            );
            return Ok(());
        }

        let Some(mirror) = mirror else {
            println!("No mirror configured. Run `replica init --source <dir> --replica <dir>`.");
            return Ok(());
        };
        print_table(&mirror, last_pass.as_ref());
        Ok(())
    }
}

#[derive(Serialize)]
struct StatusJson<'a> {
    configured: bool,
    mirror: Option<&'a MirrorConfig>,
    last_pass: Option<&'a LastPass>,
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "setting")]
    setting: &'static str,
    #[tabled(rename = "value")]
    value: String,
}

fn print_table(mirror: &MirrorConfig, last_pass: Option<&LastPass>) {
    println!("Replica v{}", env!("CARGO_PKG_VERSION"));

    let interval = match mirror.interval_secs {
        Some(secs) => format!("every {secs}s"),
        None => "manual".to_string(),
    };
    let rows = vec![
        row("source", mirror.source.display().to_string()),
        row("replica", mirror.replica.display().to_string()),
        row("event log", mirror.log_file.display().to_string()),
        row("interval", interval),
        row("configured", local_time(mirror.created_at)),
        row("updated", local_time(mirror.updated_at)),
        row("last pass", describe_last_pass(last_pass)),
    ];
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if let Some(last) = last_pass.filter(|last| !last.is_ok()) {
        let error = last.error.as_deref().unwrap_or("unknown error");
        println!("{} last pass aborted: {error}", "✗".red().bold());
    }
}

fn row(setting: &'static str, value: String) -> StatusRow {
    StatusRow { setting, value }
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn describe_last_pass(last_pass: Option<&LastPass>) -> String {
    let Some(last) = last_pass else {
        return "never".to_string();
    };
    let finished = DateTime::<Utc>::from_timestamp(last.finished_at_unix as i64, 0)
        .map(local_time)
        .unwrap_or_else(|| "unknown time".to_string());
    match &last.report {
        Some(report) => format!(
            "#{} at {finished}: {} added, {} deleted, {} modified",
            last.pass, report.created, report.deleted, report.modified
        ),
        None => format!("#{} at {finished}: aborted", last.pass),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replica_sync::PassReport;

    #[test]
    fn never_ran_reads_as_never() {
        assert_eq!(describe_last_pass(None), "never");
    }

    #[test]
    fn successful_pass_lists_counts() {
        let report = PassReport {
            created: 2,
            modified: 1,
            ..Default::default()
        };
        let text = describe_last_pass(Some(&LastPass::succeeded(4, report)));
        assert!(text.starts_with("#4 at "));
        assert!(text.ends_with("2 added, 0 deleted, 1 modified"));
    }

    #[test]
    fn failed_pass_reads_as_aborted() {
        let text = describe_last_pass(Some(&LastPass::failed(1, "disk full")));
        assert!(text.ends_with(": aborted"));
    }
}
