//! Shared pass entrypoint used by CLI and daemon.

use replica_core::MirrorConfig;

use crate::{EventLogger, FileEventLog, PassReport, SyncError, Synchronizer};

/// Event logger writing to the configured log file.
pub fn event_log_for(config: &MirrorConfig, echo: bool) -> FileEventLog {
    FileEventLog::new(&config.log_file, echo)
}

/// Run one pass for a configured mirror.
///
/// A pass aborted by a failed copy or delete also leaves one `Error: …`
/// line in the event log before the error is returned.
pub fn run<L: EventLogger>(
    config: &MirrorConfig,
    synchronizer: &mut Synchronizer<L>,
) -> Result<PassReport, SyncError> {
    let result = synchronizer.synchronize(&config.source, &config.replica);
    match &result {
        Ok(report) => tracing::info!(
            "pass complete: {} created, {} deleted, {} modified in {}ms",
            report.created,
            report.deleted,
            report.modified,
            report.duration_ms
        ),
        Err(err) => {
            synchronizer.logger_mut().log(&format!("Error: {err}"));
            tracing::error!("pass aborted: {err}");
        }
    }
    result
}
