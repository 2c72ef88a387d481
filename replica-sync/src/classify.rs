//! Directory-level change classification.
//!
//! Given the listings of one (source, replica) directory pair and the
//! staleness tracker, decide which names are new, gone, modified, or
//! shared subdirectories to descend into. Only source file metadata is
//! read here; nothing on disk and nothing in the tracker is written. The
//! mtimes that made a file `modified` are returned in
//! [`Classification::observed`] for the caller to record.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use replica_core::{EntryKind, Listing};

use crate::error::{listing_err, SyncError};
use crate::staleness::StalenessTracker;

/// Outcome of classifying one directory pair. All name sets are sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// In source, not in replica.
    pub created: BTreeSet<OsString>,
    /// In replica, not in source.
    pub deleted: BTreeSet<OsString>,
    /// Regular file on both sides, source newer than last recorded.
    pub modified: BTreeSet<OsString>,
    /// Directory on both sides.
    pub common_dirs: BTreeSet<OsString>,
    /// Present on both sides with different kinds: (source kind, replica kind).
    pub mismatched: BTreeMap<OsString, (EntryKind, EntryKind)>,
    /// Special files in source, not in replica. Never copied.
    pub special: BTreeSet<OsString>,
    /// Replica path and source mtime for every `modified` name.
    pub observed: Vec<(PathBuf, SystemTime)>,
}

impl Classification {
    /// Whether this level needs any create, delete or copy.
    pub fn has_changes(&self) -> bool {
        !(self.created.is_empty() && self.deleted.is_empty() && self.modified.is_empty())
    }

    /// One multi-line message per non-empty category, in the order
    /// new, deleted, modified.
    pub fn summary_messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        for (names, heading, verb) in [
            (&self.created, "New files:", "Added"),
            (&self.deleted, "Deleted files:", "Deleted"),
            (&self.modified, "Modified files:", "Modified"),
        ] {
            if names.is_empty() {
                continue;
            }
            let mut message = heading.to_string();
            for name in names {
                message.push_str(&format!("\n - {verb} {}", name.to_string_lossy()));
            }
            messages.push(message);
        }
        messages
    }

    /// Entries left alone at this level, as errors: kind mismatches, then
    /// special files, each in name order.
    pub fn entry_errors(&self) -> impl Iterator<Item = SyncError> + '_ {
        let mismatches =
            self.mismatched
                .iter()
                .map(|(name, (source_kind, replica_kind))| SyncError::KindMismatch {
                    name: name.clone(),
                    source_kind: *source_kind,
                    replica_kind: *replica_kind,
                });
        let specials = self.special.iter().map(|name| SyncError::SpecialFile {
            path: PathBuf::from(name),
        });
        mismatches.chain(specials)
    }
}

/// Classify one directory pair from its two listings.
///
/// Fails only when a source file shared with the replica cannot be stat'ed.
pub fn classify(
    source_dir: &Path,
    replica_dir: &Path,
    source: &Listing,
    replica: &Listing,
    tracker: &StalenessTracker,
) -> Result<Classification, SyncError> {
    let mut out = Classification::default();

    for (name, source_kind) in source {
        let Some(replica_kind) = replica.get(name) else {
            if *source_kind == EntryKind::Other {
                out.special.insert(name.clone());
            } else {
                out.created.insert(name.clone());
            }
            continue;
        };

        match (source_kind, replica_kind) {
            (EntryKind::File, EntryKind::File) => {
                let source_path = source_dir.join(name);
                let mtime = std::fs::metadata(&source_path)
                    .and_then(|meta| meta.modified())
                    .map_err(|e| listing_err(&source_path, e))?;
                let replica_path = replica_dir.join(name);
                if tracker.is_stale(&replica_path, mtime) {
                    out.modified.insert(name.clone());
                    out.observed.push((replica_path, mtime));
                }
            }
            (EntryKind::Directory, EntryKind::Directory) => {
                out.common_dirs.insert(name.clone());
            }
            (a, b) if a != b => {
                out.mismatched.insert(name.clone(), (*a, *b));
            }
            // Two special files: nothing to compare.
            _ => {}
        }
    }

    for name in replica.keys() {
        if !source.contains_key(name) {
            out.deleted.insert(name.clone());
        }
    }

    Ok(out)
}
