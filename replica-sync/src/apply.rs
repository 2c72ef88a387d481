//! Apply phase: turn one level's [`Classification`] into filesystem mutations.
//!
//! ## Order
//!
//! 1. Copy every `created` name, then every `modified` name, source → replica.
//!    Directories are copied as a fresh subtree (fails if the destination
//!    exists); files overwrite the destination and carry over permission
//!    bits and access/modification times.
//! 2. Remove every `deleted` name from the replica.
//!
//! Files written for a `created` name (including every file of a copied
//! subtree) are registered in the [`StalenessTracker`] once the copy
//! succeeds, so the next pass does not treat them as first encounters.
//! `modified` names were already registered at classification time.
//!
//! Special files inside a copied directory are left out of the copy and
//! reported as `Error: …` events; they do not stop the phase.
//!
//! Each single mutation is bracketed by `Started …` / `Finished …` events.
//! The first failing mutation aborts the phase with [`SyncError::Io`].

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use filetime::{set_file_times, FileTime};
use serde::{Deserialize, Serialize};

use replica_core::EntryKind;

use crate::classify::Classification;
use crate::error::{io_err, SyncError};
use crate::event_log::EventLogger;
use crate::staleness::StalenessTracker;

/// Counts of mutations performed by one apply phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyStats {
    pub files_copied: usize,
    pub dirs_copied: usize,
    pub files_deleted: usize,
    pub dirs_deleted: usize,
    /// Special files left out of copied directories.
    #[serde(default)]
    pub specials_skipped: usize,
}

impl ApplyStats {
    pub fn mutations(&self) -> usize {
        self.files_copied + self.dirs_copied + self.files_deleted + self.dirs_deleted
    }

    pub fn merge(&mut self, other: ApplyStats) {
        self.files_copied += other.files_copied;
        self.dirs_copied += other.dirs_copied;
        self.files_deleted += other.files_deleted;
        self.dirs_deleted += other.dirs_deleted;
        self.specials_skipped += other.specials_skipped;
    }
}

/// Perform the copies and deletes for one directory level.
pub fn apply<L: EventLogger + ?Sized>(
    source_dir: &Path,
    replica_dir: &Path,
    classification: &Classification,
    tracker: &mut StalenessTracker,
    logger: &mut L,
) -> Result<ApplyStats, SyncError> {
    let mut stats = ApplyStats::default();

    for name in &classification.created {
        copy_entry(source_dir, replica_dir, name, Some(&mut *tracker), logger, &mut stats)?;
    }
    for name in &classification.modified {
        copy_entry(source_dir, replica_dir, name, None, logger, &mut stats)?;
    }

    for name in &classification.deleted {
        delete_entry(replica_dir, name, logger, &mut stats)?;
    }

    Ok(stats)
}

fn copy_entry<L: EventLogger + ?Sized>(
    source_dir: &Path,
    replica_dir: &Path,
    name: &OsStr,
    mut tracker: Option<&mut StalenessTracker>,
    logger: &mut L,
    stats: &mut ApplyStats,
) -> Result<(), SyncError> {
    let from = source_dir.join(name);
    let to = replica_dir.join(name);
    let shown = name.to_string_lossy();

    if EntryKind::of(&from).is_dir() {
        logger.log(&format!("Started copying folder {shown}"));
        let mut skipped = Vec::new();
        copy_tree(&from, &to, &mut |entry| match entry {
            TreeEntry::Copied(path, mtime) => {
                if let Some(tracker) = tracker.as_deref_mut() {
                    tracker.record(path, mtime);
                }
            }
            TreeEntry::Skipped(path) => skipped.push(path),
        })?;
        for path in skipped {
            let relative = match path.strip_prefix(source_dir) {
                Ok(relative) => relative.to_path_buf(),
                Err(_) => path.clone(),
            };
            logger.log(&format!("Error: {}", SyncError::SpecialFile { path: relative }));
            stats.specials_skipped += 1;
        }
        logger.log(&format!("Finished copying folder {shown}"));
        stats.dirs_copied += 1;
    } else {
        logger.log(&format!("Started copying file {shown}"));
        let mtime = copy_file(&from, &to)?;
        if let Some(tracker) = tracker {
            tracker.record(to, mtime);
        }
        logger.log(&format!("Finished copying file {shown}"));
        stats.files_copied += 1;
    }
    Ok(())
}

fn delete_entry<L: EventLogger + ?Sized>(
    replica_dir: &Path,
    name: &OsStr,
    logger: &mut L,
    stats: &mut ApplyStats,
) -> Result<(), SyncError> {
    let target = replica_dir.join(name);
    let shown = name.to_string_lossy();

    // A symlink is removed as a link, never followed into its target.
    let is_dir = fs::symlink_metadata(&target)
        .map(|meta| meta.is_dir())
        .map_err(|e| io_err(&target, e))?;

    if is_dir {
        logger.log(&format!("Started deleting folder {shown}"));
        fs::remove_dir_all(&target).map_err(|e| io_err(&target, e))?;
        logger.log(&format!("Finished deleting folder {shown}"));
        stats.dirs_deleted += 1;
    } else {
        logger.log(&format!("Started deleting file {shown}"));
        fs::remove_file(&target).map_err(|e| io_err(&target, e))?;
        logger.log(&format!("Finished deleting file {shown}"));
        stats.files_deleted += 1;
    }
    Ok(())
}

/// Copy file content, permission bits and timestamps, overwriting `to`.
///
/// Returns the source modification time that was carried over.
pub(crate) fn copy_file(from: &Path, to: &Path) -> Result<SystemTime, SyncError> {
    fs::copy(from, to).map_err(|e| io_err(to, e))?;
    copy_times(from, to)
}

/// Copy the directory `from` to a new directory `to`, recursively.
///
/// Fails if `to` already exists. `on_file` sees every copied file's
/// destination and source mtime.
/// One non-directory entry met while copying a tree.
pub(crate) enum TreeEntry {
    /// Copied to this replica path; carries the source mtime.
    Copied(PathBuf, SystemTime),
    /// Special file at this source path, not copied.
    Skipped(PathBuf),
}

pub(crate) fn copy_tree(
    from: &Path,
    to: &Path,
    visit: &mut dyn FnMut(TreeEntry),
) -> Result<(), SyncError> {
    fs::create_dir(to).map_err(|e| io_err(to, e))?;

    let mut children: Vec<_> = fs::read_dir(from)
        .map_err(|e| io_err(from, e))?
        .collect::<Result<_, _>>()
        .map_err(|e| io_err(from, e))?;
    children.sort_by_key(|entry| entry.file_name());

    for child in children {
        let child_from = child.path();
        let child_to = to.join(child.file_name());
        match EntryKind::of(&child_from) {
            EntryKind::Directory => copy_tree(&child_from, &child_to, visit)?,
            EntryKind::File => {
                let mtime = copy_file(&child_from, &child_to)?;
                visit(TreeEntry::Copied(child_to, mtime));
            }
            EntryKind::Other => visit(TreeEntry::Skipped(child_from)),
        }
    }

    let perms = fs::metadata(from)
        .map_err(|e| io_err(from, e))?
        .permissions();
    fs::set_permissions(to, perms).map_err(|e| io_err(to, e))?;
    copy_times(from, to)?;
    Ok(())
}

fn copy_times(from: &Path, to: &Path) -> Result<SystemTime, SyncError> {
    let meta = fs::metadata(from).map_err(|e| io_err(from, e))?;
    let atime = FileTime::from_last_access_time(&meta);
    let mtime = FileTime::from_last_modification_time(&meta);
    set_file_times(to, atime, mtime).map_err(|e| io_err(to, e))?;
    meta.modified().map_err(|e| io_err(from, e))
}
