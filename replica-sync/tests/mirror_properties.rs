use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

use filetime::{set_file_mtime, FileTime};
use replica_sync::{EventLogger, MemoryEventLog, Synchronizer, COMPLETED_MESSAGE};
use tempfile::TempDir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn trees() -> (TempDir, PathBuf, PathBuf) {
    init_logging();
    let tmp = TempDir::new().expect("tmp");
    let source = tmp.path().join("source");
    let replica = tmp.path().join("replica");
    fs::create_dir_all(&source).expect("mkdir source");
    fs::create_dir_all(&replica).expect("mkdir replica");
    (tmp, source, replica)
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir parent");
    }
    fs::write(path, content).expect("write");
}

/// Relative path → "dir" or file content, for every entry under `root`.
fn snapshot(root: &Path) -> Vec<(String, String)> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<(String, String)>) {
        let mut entries: Vec<_> = fs::read_dir(dir)
            .expect("read_dir")
            .map(|e| e.expect("entry").path())
            .collect();
        entries.sort();
        for path in entries {
            let rel = path
                .strip_prefix(root)
                .expect("prefix")
                .to_string_lossy()
                .replace('\\', "/");
            if path.is_dir() {
                out.push((rel, "dir".to_string()));
                walk(root, &path, out);
            } else {
                out.push((rel, fs::read_to_string(&path).expect("read")));
            }
        }
    }
    let mut out = Vec::new();
    walk(root, root, &mut out);
    out
}

fn at(secs: u64) -> FileTime {
    FileTime::from_system_time(UNIX_EPOCH + Duration::from_secs(secs))
}

#[test]
fn new_file_into_empty_replica() {
    let (_tmp, source, replica) = trees();
    write(&source.join("a.txt"), "x");

    let mut sync = Synchronizer::new(MemoryEventLog::new());
    let report = sync.synchronize(&source, &replica).expect("pass");

    assert_eq!(report.created, 1);
    assert_eq!(fs::read_to_string(replica.join("a.txt")).expect("read"), "x");
    let messages = sync.logger().messages();
    assert!(messages.contains(&"Started copying file a.txt".to_string()));
    assert!(messages.contains(&"Finished copying file a.txt".to_string()));
    assert_eq!(
        messages.iter().filter(|m| *m == COMPLETED_MESSAGE).count(),
        1
    );
}

#[test]
fn stray_replica_file_is_removed_and_identical_subdir_is_quiet() {
    let (_tmp, source, replica) = trees();
    write(&source.join("b/keep.txt"), "k");
    write(&replica.join("b/keep.txt"), "k");
    write(&replica.join("old.log"), "stale");

    let mut sync = Synchronizer::new(MemoryEventLog::new());
    // keep.txt is a first encounter on the first pass; settle it.
    sync.synchronize(&source, &replica).expect("first pass");
    write(&replica.join("old.log"), "stale");
    sync.logger_mut().take();

    let report = sync.synchronize(&source, &replica).expect("second pass");
    assert_eq!(report.deleted, 1);
    assert_eq!(report.levels, 2);
    assert!(!replica.join("old.log").exists());
    assert_eq!(
        sync.logger().messages(),
        [
            "Deleted files:\n - Deleted old.log",
            "Started deleting file old.log",
            "Finished deleting file old.log",
            "Sync Completed.",
        ]
    );
}

#[test]
fn second_pass_without_changes_is_silent() {
    let (_tmp, source, replica) = trees();
    write(&source.join("top.txt"), "t");
    write(&source.join("docs/guide.md"), "g");
    write(&source.join("docs/img/logo.svg"), "<svg/>");
    write(&replica.join("docs/guide.md"), "old guide");
    write(&replica.join("docs/obsolete.md"), "o");

    let mut sync = Synchronizer::new(MemoryEventLog::new());
    sync.synchronize(&source, &replica).expect("first pass");
    sync.logger_mut().take();
    let before = snapshot(&replica);

    let report = sync.synchronize(&source, &replica).expect("second pass");
    assert!(!report.has_changes());
    assert_eq!(report.applied.mutations(), 0);
    assert!(sync.logger().is_empty(), "{:?}", sync.logger().messages());
    assert_eq!(snapshot(&replica), before);
}

#[test]
fn one_pass_mirrors_the_whole_tree() {
    let (_tmp, source, replica) = trees();
    write(&source.join("a.txt"), "a");
    write(&source.join("nested/b.txt"), "b");
    write(&source.join("nested/deeper/c.txt"), "c");
    write(&source.join("shared/d.txt"), "d-new");
    write(&replica.join("shared/d.txt"), "d-old");
    write(&replica.join("shared/extra/e.txt"), "e");
    write(&replica.join("gone.txt"), "gone");
    fs::create_dir_all(source.join("empty")).expect("mkdir");

    let mut sync = Synchronizer::new(MemoryEventLog::new());
    sync.synchronize(&source, &replica).expect("pass");

    assert_eq!(snapshot(&replica), snapshot(&source));
}

#[test]
fn unchanged_mtime_is_not_recopied_and_newer_mtime_is() {
    let (_tmp, source, replica) = trees();
    let file = source.join("c.txt");
    write(&file, "v1");
    set_file_mtime(&file, at(1_700_000_000)).expect("mtime");

    let mut sync = Synchronizer::new(MemoryEventLog::new());
    let report = sync.synchronize(&source, &replica).expect("create pass");
    assert_eq!(report.created, 1);
    let report = sync.synchronize(&source, &replica).expect("quiet pass");
    assert_eq!(report.modified, 0);
    assert_eq!(report.applied.mutations(), 0);

    write(&file, "v2");
    set_file_mtime(&file, at(1_700_000_100)).expect("mtime");
    sync.logger_mut().take();
    let report = sync.synchronize(&source, &replica).expect("modified pass");
    assert_eq!(report.modified, 1);
    assert_eq!(fs::read_to_string(replica.join("c.txt")).expect("read"), "v2");
    assert_eq!(
        sync.logger().messages(),
        [
            "Modified files:\n - Modified c.txt",
            "Started copying file c.txt",
            "Finished copying file c.txt",
            "Sync Completed.",
        ]
    );
    assert_eq!(
        sync.tracker().get(&replica.join("c.txt")),
        Some(UNIX_EPOCH + Duration::from_secs(1_700_000_100))
    );

    let report = sync.synchronize(&source, &replica).expect("repeat pass");
    assert_eq!(report.modified, 0);
}

#[test]
fn identical_files_are_copied_once_on_first_encounter() {
    let (_tmp, source, replica) = trees();
    write(&source.join("same.txt"), "same");
    write(&replica.join("same.txt"), "same");

    let mut sync = Synchronizer::new(MemoryEventLog::new());
    let report = sync.synchronize(&source, &replica).expect("pass");
    assert_eq!(report.modified, 1);
    assert_eq!(report.applied.files_copied, 1);

    let report = sync.synchronize(&source, &replica).expect("pass");
    assert_eq!(report.modified, 0);
}

#[test]
fn older_source_mtime_never_triggers_copy() {
    let (_tmp, source, replica) = trees();
    let file = source.join("f.txt");
    write(&file, "x");
    write(&replica.join("f.txt"), "x");
    set_file_mtime(&file, at(1_700_000_000)).expect("mtime");

    let mut sync = Synchronizer::new(MemoryEventLog::new());
    sync.synchronize(&source, &replica).expect("pass");

    set_file_mtime(&file, at(1_600_000_000)).expect("mtime");
    let report = sync.synchronize(&source, &replica).expect("pass");
    assert_eq!(report.modified, 0);
}

#[test]
fn separate_synchronizers_do_not_share_staleness() {
    let (_tmp, source, replica) = trees();
    write(&source.join("a.txt"), "a");
    write(&replica.join("a.txt"), "a");

    let mut first = Synchronizer::new(MemoryEventLog::new());
    first.synchronize(&source, &replica).expect("pass");

    let mut second = Synchronizer::new(MemoryEventLog::new());
    let report = second.synchronize(&source, &replica).expect("pass");
    assert_eq!(report.modified, 1, "fresh tracker sees a first encounter");
}

#[test]
fn deletes_run_after_copies_within_a_level() {
    let (_tmp, source, replica) = trees();
    write(&source.join("b_new.txt"), "n");
    write(&replica.join("a_old.txt"), "o");

    let mut sync = Synchronizer::new(MemoryEventLog::new());
    sync.synchronize(&source, &replica).expect("pass");

    let messages = sync.logger().messages();
    let copy = messages
        .iter()
        .position(|m| m == "Finished copying file b_new.txt")
        .expect("copy event");
    let delete = messages
        .iter()
        .position(|m| m == "Started deleting file a_old.txt")
        .expect("delete event");
    assert!(copy < delete);
}

/// Removes `victim` once `trigger` is logged.
struct Saboteur {
    trigger: &'static str,
    victim: PathBuf,
    messages: Vec<String>,
}

impl EventLogger for Saboteur {
    fn log(&mut self, message: &str) {
        if message == self.trigger {
            let _ = fs::remove_dir_all(&self.victim);
        }
        self.messages.push(message.to_string());
    }
}

#[test]
fn unreadable_subtree_does_not_stop_siblings() {
    let (_tmp, source, replica) = trees();
    write(&source.join("top.txt"), "t");
    write(&source.join("a/one.txt"), "1");
    write(&source.join("z/two.txt"), "2");
    fs::create_dir_all(replica.join("a")).expect("mkdir");
    fs::create_dir_all(replica.join("z")).expect("mkdir");

    // The replica side of `a` disappears after the top level is classified.
    let logger = Saboteur {
        trigger: "Finished copying file top.txt",
        victim: replica.join("a"),
        messages: Vec::new(),
    };
    let mut sync = Synchronizer::new(logger);
    let report = sync.synchronize(&source, &replica).expect("pass");

    assert_eq!(report.listing_errors, 1);
    assert_eq!(report.levels, 3);
    assert_eq!(fs::read_to_string(replica.join("z/two.txt")).expect("read"), "2");

    let messages = &sync.logger().messages;
    let error = messages
        .iter()
        .position(|m| m.starts_with("Error: cannot read ") && m.contains("replica"))
        .expect("listing error event");
    let sibling = messages
        .iter()
        .position(|m| m == "Finished copying file two.txt")
        .expect("sibling copied");
    assert!(error < sibling);
    assert_eq!(messages.last().map(String::as_str), Some(COMPLETED_MESSAGE));
}

/// Run one pass on another thread; `None` if it has not finished in time.
#[cfg(unix)]
fn pass_within(
    source: PathBuf,
    replica: PathBuf,
    limit: Duration,
) -> Option<(replica_sync::PassReport, Vec<String>)> {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let mut sync = Synchronizer::new(MemoryEventLog::new());
        let report = sync.synchronize(&source, &replica).expect("pass");
        let _ = tx.send((report, sync.logger().messages().to_vec()));
    });
    rx.recv_timeout(limit).ok()
}

#[cfg(unix)]
#[test]
fn fifo_in_fresh_source_does_not_block_the_pass() {
    let (_tmp, source, replica) = trees();
    write(&source.join("after.txt"), "a");
    write(&source.join("nested/inner.txt"), "i");
    for fifo in [source.join("pipe"), source.join("nested/pipe")] {
        let status = std::process::Command::new("mkfifo")
            .arg(&fifo)
            .status()
            .expect("run mkfifo");
        assert!(status.success());
    }

    let (report, messages) = pass_within(source, replica.clone(), Duration::from_secs(10))
        .expect("pass finished while a fifo was in the source");

    assert_eq!(report.special_files, 1);
    assert_eq!(report.applied.specials_skipped, 1);
    assert!(messages.contains(&"Error: pipe is a special file and cannot be copied".to_string()));
    assert!(messages
        .contains(&"Error: nested/pipe is a special file and cannot be copied".to_string()));
    assert_eq!(
        snapshot(&replica),
        vec![
            ("after.txt".to_string(), "a".to_string()),
            ("nested".to_string(), "dir".to_string()),
            ("nested/inner.txt".to_string(), "i".to_string()),
        ]
    );
}

#[cfg(unix)]
#[test]
fn dangling_link_in_fresh_source_is_skipped_every_pass() {
    let (tmp, source, replica) = trees();
    std::os::unix::fs::symlink(tmp.path().join("nowhere"), source.join("broken"))
        .expect("symlink");
    write(&source.join("zed.txt"), "z");

    let mut sync = Synchronizer::new(MemoryEventLog::new());
    for _ in 0..2 {
        let report = sync.synchronize(&source, &replica).expect("pass");
        assert_eq!(report.special_files, 1);
    }

    assert!(replica.join("zed.txt").exists());
    let errors = sync
        .logger()
        .messages()
        .iter()
        .filter(|m| *m == "Error: broken is a special file and cannot be copied")
        .count();
    assert_eq!(errors, 2);
}
