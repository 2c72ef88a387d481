//! Size-based rotation of the event log.
//!
//! The driver appends to one event log forever, so before each pass the
//! file is rotated once it reaches the size limit:
//!   replica.log → replica.log.1 → replica.log.2 → … → replica.log.<keep>

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default size limit before rotation (10 MiB).
pub const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

/// Default number of rotated copies kept.
pub const MAX_ROTATED_FILES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    pub max_bytes: u64,
    pub keep: usize,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: MAX_LOG_BYTES,
            keep: MAX_ROTATED_FILES,
        }
    }
}

impl RotationPolicy {
    /// Rotate `log_path` if it is at least `max_bytes` long.
    ///
    /// The oldest copy is dropped, every `<name>.<n>` moves to `<name>.<n+1>`,
    /// and the live file becomes `<name>.1`. The next event recreates the
    /// live file. With `keep == 0` the live file is simply truncated.
    ///
    /// Returns `true` if rotation occurred. A missing log is not an error.
    pub fn rotate(&self, log_path: &Path) -> io::Result<bool> {
        let size = match fs::metadata(log_path) {
            Ok(meta) => meta.len(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(err) => return Err(err),
        };
        if size < self.max_bytes {
            return Ok(false);
        }

        if self.keep == 0 {
            fs::OpenOptions::new()
                .write(true)
                .truncate(true)
                .open(log_path)?;
            return Ok(true);
        }

        let oldest = numbered_path(log_path, self.keep);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for n in (1..self.keep).rev() {
            let src = numbered_path(log_path, n);
            if src.exists() {
                fs::rename(&src, numbered_path(log_path, n + 1))?;
            }
        }
        fs::rename(log_path, numbered_path(log_path, 1))?;
        Ok(true)
    }

    /// Rotate and report the outcome through tracing; never fails.
    pub fn rotate_logged(&self, log_path: &Path) {
        match self.rotate(log_path) {
            Ok(true) => tracing::info!(path = %log_path.display(), "event log rotated"),
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(path = %log_path.display(), error = %err, "event log rotation failed")
            }
        }
    }
}

/// `<base>.<n>`, e.g. `replica.log.2`.
fn numbered_path(base: &Path, n: usize) -> PathBuf {
    let mut name = base
        .file_name()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "replica.log".into());
    name.push(format!(".{n}"));
    base.with_file_name(name)
}
