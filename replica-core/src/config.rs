//! Persisted mirror configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.replica/
//!   config.yaml   (mode 0600, written by `replica init`)
//!   logs/
//!     replica.log (default event log)
//! ```
//!
//! # API pattern
//!
//! Every function touching the config has two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Current on-disk schema version.
pub const CONFIG_VERSION: u32 = 1;

/// One source → replica mirror and how it is driven.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorConfig {
    pub version: u32,
    /// Authoritative tree.
    pub source: PathBuf,
    /// Tree kept identical to `source`.
    pub replica: PathBuf,
    /// Event log receiving one timestamped line per sync event.
    pub log_file: PathBuf,
    /// Seconds between automatic passes. `None` means manual passes only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MirrorConfig {
    pub fn new(
        source: PathBuf,
        replica: PathBuf,
        log_file: PathBuf,
        interval_secs: Option<u64>,
    ) -> Self {
        let now = Utc::now();
        Self {
            version: CONFIG_VERSION,
            source,
            replica,
            log_file,
            interval_secs,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reject configurations that cannot describe a one-way mirror.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, path) in [
            ("source", &self.source),
            ("replica", &self.replica),
            ("log_file", &self.log_file),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!("{field} path is empty")));
            }
        }

        let source = resolve(&self.source);
        let replica = resolve(&self.replica);
        if source == replica {
            return Err(ConfigError::Invalid(format!(
                "source and replica are the same directory: {}",
                source.display()
            )));
        }
        if replica.starts_with(&source) {
            return Err(ConfigError::Invalid(format!(
                "replica {} lies inside source {}",
                replica.display(),
                source.display()
            )));
        }
        // The source would show up in the replica listing and be deleted.
        if source.starts_with(&replica) {
            return Err(ConfigError::Invalid(format!(
                "source {} lies inside replica {}",
                source.display(),
                replica.display()
            )));
        }

        if self.interval_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "interval must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.replica/`
pub fn root_at(home: &Path) -> PathBuf {
    home.join(".replica")
}

/// `<home>/.replica/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    root_at(home).join("config.yaml")
}

/// `<home>/.replica/logs/replica.log`: used when no log path is given.
pub fn default_log_path_at(home: &Path) -> PathBuf {
    root_at(home).join("logs").join("replica.log")
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load the config from `<home>/.replica/config.yaml`.
///
/// Returns `ConfigError::NotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(home: &Path) -> Result<MirrorConfig, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Err(ConfigError::NotFound { path });
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<MirrorConfig, ConfigError> {
    load_at(&home()?)
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save the config to `<home>/.replica/config.yaml`.
///
/// Write flow: serialize → `config.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_at(home: &Path, config: &MirrorConfig) -> Result<(), ConfigError> {
    let root = root_at(home);
    if !root.exists() {
        std::fs::create_dir_all(&root)?;
        set_dir_permissions(&root)?;
    }
    let path = config_path_at(home);
    let tmp_path = path.with_file_name("config.yaml.tmp");

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path)?;
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(config: &MirrorConfig) -> Result<(), ConfigError> {
    save_at(&home()?, config)
}

// ---------------------------------------------------------------------------
// 4. Init
// ---------------------------------------------------------------------------

/// Validate and store a mirror configuration.
///
/// Re-running init replaces the paths and interval but keeps the original
/// `created_at`.
pub fn init_at(
    home: &Path,
    source: PathBuf,
    replica: PathBuf,
    log_file: Option<PathBuf>,
    interval_secs: Option<u64>,
) -> Result<MirrorConfig, ConfigError> {
    let log_file = log_file.unwrap_or_else(|| default_log_path_at(home));
    let mut config = MirrorConfig::new(source, replica, log_file, interval_secs);
    config.validate()?;

    match load_at(home) {
        Ok(existing) => config.created_at = existing.created_at,
        Err(ConfigError::NotFound { .. }) => {}
        Err(err) => return Err(err),
    }

    save_at(home, &config)?;
    Ok(config)
}

/// `init_at` convenience wrapper.
pub fn init(
    source: PathBuf,
    replica: PathBuf,
    log_file: Option<PathBuf>,
    interval_secs: Option<u64>,
) -> Result<MirrorConfig, ConfigError> {
    init_at(&home()?, source, replica, log_file, interval_secs)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

/// Absolute, `.`/`..`-free form of `path` for nesting checks.
///
/// The longest existing ancestor is canonicalized and the missing tail is
/// appended, so a path that does not exist yet compares the same way as
/// its existing parent.
fn resolve(path: &Path) -> PathBuf {
    let absolute = match std::env::current_dir() {
        Ok(cwd) if path.is_relative() => cwd.join(path),
        _ => path.to_path_buf(),
    };
    let normalized = normalize(&absolute);

    let mut existing = normalized.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(canonical) = std::fs::canonicalize(existing) {
            return missing
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, part| acc.join(part));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return normalized,
        }
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
