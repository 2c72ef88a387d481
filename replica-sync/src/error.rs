//! Error types for replica-sync.

use std::ffi::OsString;
use std::path::PathBuf;

use thiserror::Error;

use replica_core::EntryKind;

/// All errors that can arise from a synchronization pass.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A source or replica directory could not be listed, or a source file
    /// could not be stat'ed while classifying. Recovered at the level where
    /// it happens.
    #[error("cannot read {path}: {source}")]
    Listing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A copy, delete or stat failed while mutating the replica. Aborts the pass.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The same name is a file on one side and a directory on the other.
    #[error(
        "{} is a {source_kind} in source but a {replica_kind} in replica",
        name.to_string_lossy()
    )]
    KindMismatch {
        name: OsString,
        source_kind: EntryKind,
        replica_kind: EntryKind,
    },

    /// A fifo, socket, device or dangling link where a copy would be needed.
    /// Skipped; the rest of the level carries on.
    #[error("{} is a special file and cannot be copied", path.display())]
    SpecialFile { path: PathBuf },
}

impl SyncError {
    /// Whether the pass may continue past this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SyncError::Io { .. })
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`SyncError::Listing`].
pub(crate) fn listing_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Listing {
        path: path.into(),
        source,
    }
}
