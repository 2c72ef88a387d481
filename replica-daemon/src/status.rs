//! Outcome of the driver's most recent pass, persisted as JSON so that
//! `replica status` can report on a running driver.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use replica_sync::PassReport;

use crate::error::{io_err, DaemonError};
use crate::paths::last_pass_path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastPass {
    /// 1-based pass number within the driver run.
    pub pass: usize,
    pub finished_at_unix: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<PassReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LastPass {
    pub fn succeeded(pass: usize, report: PassReport) -> Self {
        Self {
            pass,
            finished_at_unix: unix_seconds_now(),
            report: Some(report),
            error: None,
        }
    }

    pub fn failed(pass: usize, error: impl ToString) -> Self {
        Self {
            pass,
            finished_at_unix: unix_seconds_now(),
            report: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Load `<home>/.replica/run/last_pass.json`; `None` if no pass ran yet.
pub fn load_at(home: &Path) -> Result<Option<LastPass>, DaemonError> {
    let path = last_pass_path(home);
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_err(&path, err)),
    };
    Ok(Some(serde_json::from_str(&contents)?))
}

/// Save atomically via a `.tmp` sibling.
pub fn save_at(home: &Path, last: &LastPass) -> Result<(), DaemonError> {
    let path = last_pass_path(home);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    let json = serde_json::to_string_pretty(last)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

pub(crate) fn unix_seconds_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
