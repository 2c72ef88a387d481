//! Config error-message, atomic-write-safety, and validation integration tests.

use std::fs;
use std::path::PathBuf;

use assert_fs::prelude::*;
use predicates::prelude::*;
use replica_core::{config, ConfigError, MirrorConfig};
use rstest::rstest;

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_config_names_the_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("config not found"));
    assert!(err.to_string().contains("config.yaml"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let dir = home.path().join(".replica");
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(dir.join("config.yaml"), b": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"));
}

#[test]
fn load_missing_field_returns_parse_error() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".replica/config.yaml")
        .write_str("version: 1\nsource: /a\n")
        .expect("write");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Persisted shape
// ---------------------------------------------------------------------------

#[test]
fn saved_yaml_carries_paths_and_omits_manual_interval() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::init_at(
        home.path(),
        PathBuf::from("/data/photos"),
        PathBuf::from("/backup/photos"),
        Some(PathBuf::from("/var/log/replica.log")),
        None,
    )
    .expect("init");

    let file = home.child(".replica/config.yaml");
    file.assert(predicate::path::exists());
    file.assert(predicate::str::contains("source: /data/photos"));
    file.assert(predicate::str::contains("replica: /backup/photos"));
    file.assert(predicate::str::contains("interval_secs").not());
}

#[test]
fn init_with_interval_persists_it() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::init_at(
        home.path(),
        PathBuf::from("/data/a"),
        PathBuf::from("/backup/a"),
        None,
        Some(60),
    )
    .expect("init");

    home.child(".replica/config.yaml")
        .assert(predicate::str::contains("interval_secs: 60"));
}

#[test]
fn invalid_init_writes_nothing() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let err = config::init_at(
        home.path(),
        PathBuf::from("/data/a"),
        PathBuf::from("/data/a/backup"),
        None,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    home.child(".replica/config.yaml")
        .assert(predicate::path::missing());
}

// ---------------------------------------------------------------------------
// 3. Validation
// ---------------------------------------------------------------------------

#[rstest]
#[case("/data/a", "/backup/a", Some(10), true)]
#[case("/data/a", "/data/b", None, true)]
#[case("/data/a", "/data/a", None, false)]
#[case("/data/a", "/data/a/nested", None, false)]
#[case("/data/a/live", "/data/a", None, false)]
#[case("src", "src/backup", None, false)]
#[case("backup/live", "backup", None, false)]
#[case("/data/a/../b", "/data/b", None, false)]
#[case("/data/ab", "/data/a", None, true)]
#[case("", "/backup/a", None, false)]
#[case("/data/a", "/backup/a", Some(0), false)]
fn validate_cases(
    #[case] source: &str,
    #[case] replica: &str,
    #[case] interval: Option<u64>,
    #[case] ok: bool,
) {
    let cfg = MirrorConfig::new(
        PathBuf::from(source),
        PathBuf::from(replica),
        PathBuf::from("/tmp/replica.log"),
        interval,
    );
    assert_eq!(cfg.validate().is_ok(), ok, "{source} -> {replica} ({interval:?})");
}
