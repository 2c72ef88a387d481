//! Replica core library: directory entry types, configuration persistence, errors.
//!
//! - [`types`]: directory entries and their kinds
//! - [`error`]: [`ConfigError`]
//! - [`config`]: load / save / init of the mirror configuration

pub mod config;
pub mod error;
pub mod types;

pub use config::MirrorConfig;
pub use error::ConfigError;
pub use types::{read_listing, DirectoryEntry, EntryKind, Listing};
