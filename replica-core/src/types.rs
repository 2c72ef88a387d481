//! Directory entry types shared by the classifier and the apply phase.
//!
//! Entries are never persisted; they only exist as the result of listing a
//! directory at one point in time. Names stay `OsString` so that non-UTF-8
//! names survive the round trip from listing to copy.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What a directory entry resolves to when stat'ed (symlinks followed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    /// Neither a regular file nor a directory: dangling symlink, socket, fifo.
    Other,
}

impl EntryKind {
    /// Resolve the kind of `path`, following symlinks.
    ///
    /// A path that cannot be stat'ed (e.g. a dangling symlink) is `Other`.
    pub fn of(path: &Path) -> Self {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => EntryKind::Directory,
            Ok(meta) if meta.is_file() => EntryKind::File,
            _ => EntryKind::Other,
        }
    }

    pub fn is_dir(self) -> bool {
        self == EntryKind::Directory
    }

    pub fn is_file(self) -> bool {
        self == EntryKind::File
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Directory => write!(f, "folder"),
            EntryKind::Other => write!(f, "special file"),
        }
    }
}

// ---------------------------------------------------------------------------
// Entries and listings
// ---------------------------------------------------------------------------

/// One named entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: OsString,
    pub kind: EntryKind,
}

impl DirectoryEntry {
    /// Stat `dir/name` and build the entry.
    pub fn stat(dir: &Path, name: &OsStr) -> Self {
        Self {
            name: name.to_owned(),
            kind: EntryKind::of(&dir.join(name)),
        }
    }
}

/// A directory listing keyed by entry name, iterated in lexicographic order.
pub type Listing = BTreeMap<OsString, EntryKind>;

/// List `dir` and resolve the kind of every entry.
///
/// Fails if the directory itself cannot be read or an entry cannot be
/// enumerated; the kind of an individual entry never fails (see [`EntryKind::of`]).
pub fn read_listing(dir: &Path) -> io::Result<Listing> {
    let mut listing = Listing::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let resolved = DirectoryEntry::stat(dir, &entry.file_name());
        listing.insert(resolved.name, resolved.kind);
    }
    Ok(listing)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
