use std::path::{Path, PathBuf};

use replica_core::config;

pub const LAST_PASS_FILE: &str = "last_pass.json";

pub fn replica_root(home: &Path) -> PathBuf {
    config::root_at(home)
}

pub fn run_dir(home: &Path) -> PathBuf {
    replica_root(home).join("run")
}

pub fn last_pass_path(home: &Path) -> PathBuf {
    run_dir(home).join(LAST_PASS_FILE)
}
