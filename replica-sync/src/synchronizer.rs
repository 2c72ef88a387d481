//! Recursive tree synchronizer.
//!
//! One call to [`Synchronizer::synchronize`] is one pass over the whole
//! tree. Each directory level goes through
//! `Listing → Classifying → Summarizing → Applying → Recursing → Done`;
//! a level whose source or replica cannot be read stops at `Listing`, logs
//! `Error: …`, and the rest of the pass carries on. A failed copy or delete
//! aborts the whole pass.

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use replica_core::read_listing;

use crate::apply::{apply, ApplyStats};
use crate::classify::{classify, Classification};
use crate::error::{listing_err, SyncError};
use crate::event_log::EventLogger;
use crate::staleness::StalenessTracker;

/// Event emitted after a level with differences has been fully processed.
pub const COMPLETED_MESSAGE: &str = "Sync Completed.";

/// What one pass did, summed over every level it visited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    /// Directory pairs visited, including ones that failed to list.
    pub levels: usize,
    pub created: usize,
    pub deleted: usize,
    pub modified: usize,
    pub kind_mismatches: usize,
    /// New special files in source that were not copied.
    #[serde(default)]
    pub special_files: usize,
    /// Levels skipped because a directory could not be read.
    pub listing_errors: usize,
    pub applied: ApplyStats,
    pub duration_ms: u64,
}

impl PassReport {
    /// Whether any level had a create, delete or modify.
    pub fn has_changes(&self) -> bool {
        self.created + self.deleted + self.modified > 0
    }

    fn count(&mut self, classification: &Classification) {
        self.created += classification.created.len();
        self.deleted += classification.deleted.len();
        self.modified += classification.modified.len();
        self.kind_mismatches += classification.mismatched.len();
        self.special_files += classification.special.len();
    }
}

/// Mirrors a source tree onto a replica tree, remembering staleness
/// between passes.
#[derive(Debug)]
pub struct Synchronizer<L> {
    tracker: StalenessTracker,
    logger: L,
}

impl<L: EventLogger> Synchronizer<L> {
    pub fn new(logger: L) -> Self {
        Self::with_tracker(logger, StalenessTracker::new())
    }

    pub fn with_tracker(logger: L, tracker: StalenessTracker) -> Self {
        Self { tracker, logger }
    }

    pub fn tracker(&self) -> &StalenessTracker {
        &self.tracker
    }

    pub fn logger(&self) -> &L {
        &self.logger
    }

    pub fn logger_mut(&mut self) -> &mut L {
        &mut self.logger
    }

    /// Run one pass mirroring `source` onto `replica`.
    ///
    /// Unreadable directories are logged and skipped; the returned error is
    /// always a mutation failure.
    pub fn synchronize(&mut self, source: &Path, replica: &Path) -> Result<PassReport, SyncError> {
        let started = Instant::now();
        let mut report = PassReport::default();
        self.sync_level(source, replica, &mut report)?;
        report.duration_ms = started.elapsed().as_millis() as u64;
        tracing::debug!(
            "pass {} -> {}: {} levels, {} mutations",
            source.display(),
            replica.display(),
            report.levels,
            report.applied.mutations()
        );
        Ok(report)
    }

    fn sync_level(
        &mut self,
        source: &Path,
        replica: &Path,
        report: &mut PassReport,
    ) -> Result<(), SyncError> {
        report.levels += 1;

        let classification = match self.classify_level(source, replica) {
            Ok(classification) => classification,
            Err(err) if err.is_recoverable() => {
                self.logger.log(&format!("Error: {err}"));
                report.listing_errors += 1;
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        report.count(&classification);

        for message in classification.summary_messages() {
            self.logger.log(&message);
        }
        for err in classification.entry_errors() {
            self.logger.log(&format!("Error: {err}"));
        }

        // Recorded before copying: a copy that fails below is not retried
        // until the source changes again.
        for (path, mtime) in &classification.observed {
            self.tracker.record(path.clone(), *mtime);
        }

        let stats = apply(
            source,
            replica,
            &classification,
            &mut self.tracker,
            &mut self.logger,
        )?;
        report.applied.merge(stats);

        for name in &classification.common_dirs {
            self.sync_level(&source.join(name), &replica.join(name), report)?;
        }

        if classification.has_changes() {
            self.logger.log(COMPLETED_MESSAGE);
        }
        Ok(())
    }

    fn classify_level(&self, source: &Path, replica: &Path) -> Result<Classification, SyncError> {
        let source_listing = read_listing(source).map_err(|e| listing_err(source, e))?;
        let replica_listing = read_listing(replica).map_err(|e| listing_err(replica, e))?;
        classify(
            source,
            replica,
            &source_listing,
            &replica_listing,
            &self.tracker,
        )
    }
}
