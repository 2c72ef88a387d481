//! Last-synchronized source modification times, keyed by replica file path.
//!
//! A path that has never been recorded reads as the oldest possible
//! instant, so the first time a file is seen on both sides it always
//! compares as newer and gets copied once. Entries are never evicted and
//! never persisted; a fresh tracker starts empty.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone, Default)]
pub struct StalenessTracker {
    recorded: HashMap<PathBuf, SystemTime>,
}

impl StalenessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last recorded source mtime for the replica file at `path`.
    pub fn get(&self, path: &Path) -> Option<SystemTime> {
        self.recorded.get(path).copied()
    }

    /// Record `instant` as the source mtime last synchronized into `path`.
    pub fn record(&mut self, path: impl Into<PathBuf>, instant: SystemTime) {
        self.recorded.insert(path.into(), instant);
    }

    /// Whether a source file with mtime `source_mtime` is newer than what was
    /// last recorded for `path`. Absent entries count as the oldest instant.
    pub fn is_stale(&self, path: &Path, source_mtime: SystemTime) -> bool {
        match self.get(path) {
            Some(recorded) => source_mtime > recorded,
            None => true,
        }
    }

    pub fn len(&self) -> usize {
        self.recorded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recorded.is_empty()
    }
}
