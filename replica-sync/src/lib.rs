//! # replica-sync
//!
//! One-way recursive mirroring of a source tree onto a replica tree.
//!
//! Build a [`Synchronizer`] around an [`EventLogger`] and call
//! [`Synchronizer::synchronize`] once per pass; keep the same synchronizer
//! across passes so its [`StalenessTracker`] remembers what was copied.

pub mod apply;
pub mod classify;
pub mod error;
pub mod event_log;
pub mod pipeline;
pub mod staleness;
pub mod synchronizer;

pub use apply::ApplyStats;
pub use classify::{classify, Classification};
pub use error::SyncError;
pub use event_log::{EventLogger, FileEventLog, MemoryEventLog};
pub use staleness::StalenessTracker;
pub use synchronizer::{PassReport, Synchronizer, COMPLETED_MESSAGE};
