//! Polling driver: repeated synchronization passes on an interval.

mod error;
pub mod log_rotation;
pub mod paths;
mod runtime;
pub mod status;

pub use error::DaemonError;
pub use runtime::{init_tracing, start_blocking, DriverStats, PollingDriver};
pub use status::LastPass;
