use super::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use test_support::{TempTree, snapshot, wait_until};
use watch::{ChangeEvent, WatchSet};

use crate::run::Worker;

const DEADLINE: Duration = Duration::from_secs(10);

struct Running {
    shutdown: ShutdownFlag,
    handle: JoinHandle<WorkerReport>,
}

impl Running {
    fn start(source: &Path, target: &Path) -> Self {
        let config = WorkerConfig::builder(source, target)
            .poll_interval(Duration::from_millis(20))
            .build();
        let shutdown = ShutdownFlag::new();
        let flag = shutdown.clone();
        let handle = thread::spawn(move || run_worker(&config, &flag));
        Self { shutdown, handle }
    }

    fn stop(self) -> WorkerReport {
        self.shutdown.request();
        self.handle.join().expect("worker thread")
    }
}

fn contents(path: &Path) -> Option<Vec<u8>> {
    fs::read(path).ok()
}

#[test]
fn initial_sync_mirrors_existing_tree() {
    let tree = TempTree::new();
    tree.file("src/a.txt", b"12345").file("src/d/b.txt", b"bee").dir("dst");
    let (src, dst) = (tree.path("src"), tree.path("dst"));

    let worker = Running::start(&src, &dst);
    assert!(wait_until(DEADLINE, || snapshot(&src) == snapshot(&dst)));

    let report = worker.stop();
    assert_eq!(report.state, WorkerState::Terminated);
    assert_eq!(report.reason, StopReason::ShutdownRequested);
    assert_eq!(report.exit_code(), ExitCode::Ok);
}

#[test]
fn modification_is_propagated() {
    let tree = TempTree::new();
    tree.file("src/a.txt", b"12345").dir("dst");
    let (src, dst) = (tree.path("src"), tree.path("dst"));

    let worker = Running::start(&src, &dst);
    let mirrored = dst.join("a.txt");
    assert!(wait_until(DEADLINE, || contents(&mirrored).as_deref() == Some(b"12345")));

    fs::write(src.join("a.txt"), b"12345678").expect("modify");
    assert!(wait_until(DEADLINE, || {
        contents(&mirrored).as_deref() == Some(b"12345678")
    }));

    let report = worker.stop();
    assert!(report.applied > 0);
}

#[test]
fn created_directories_are_watched_and_removals_mirrored() {
    let tree = TempTree::new();
    tree.dir("src").dir("dst");
    let (src, dst) = (tree.path("src"), tree.path("dst"));

    let worker = Running::start(&src, &dst);
    assert!(wait_until(DEADLINE, || dst.is_dir()));

    fs::create_dir_all(src.join("new/inner")).expect("mkdir");
    assert!(wait_until(DEADLINE, || dst.join("new/inner").is_dir()));

    fs::write(src.join("new/inner/file.txt"), b"deep").expect("write");
    assert!(wait_until(DEADLINE, || {
        contents(&dst.join("new/inner/file.txt")).as_deref() == Some(b"deep")
    }));

    fs::remove_dir_all(src.join("new")).expect("remove");
    assert!(wait_until(DEADLINE, || !dst.join("new").exists()));

    worker.stop();
}

#[test]
fn renames_are_mirrored() {
    let tree = TempTree::new();
    tree.file("src/old.txt", b"payload").file("src/dir/x", b"x").dir("dst");
    let (src, dst) = (tree.path("src"), tree.path("dst"));

    let worker = Running::start(&src, &dst);
    assert!(wait_until(DEADLINE, || snapshot(&src) == snapshot(&dst)));

    fs::rename(src.join("old.txt"), src.join("new.txt")).expect("rename file");
    fs::rename(src.join("dir"), src.join("moved")).expect("rename dir");
    assert!(wait_until(DEADLINE, || snapshot(&src) == snapshot(&dst)));

    fs::write(src.join("moved/y"), b"y").expect("write into moved dir");
    assert!(wait_until(DEADLINE, || dst.join("moved/y").is_file()));

    worker.stop();
}

#[test]
fn permission_changes_are_mirrored() {
    let tree = TempTree::new();
    tree.file("src/a.txt", b"a").dir("dst");
    let (src, dst) = (tree.path("src"), tree.path("dst"));

    let worker = Running::start(&src, &dst);
    assert!(wait_until(DEADLINE, || dst.join("a.txt").is_file()));

    fs::set_permissions(src.join("a.txt"), fs::Permissions::from_mode(0o600)).expect("chmod");
    assert!(wait_until(DEADLINE, || {
        fs::metadata(dst.join("a.txt"))
            .map(|metadata| metadata.permissions().mode() & 0o777 == 0o600)
            .unwrap_or(false)
    }));

    worker.stop();
}

#[test]
fn source_removal_ends_worker_cleanly() {
    let tree = TempTree::new();
    tree.file("src/a.txt", b"a").dir("dst");
    let (src, dst) = (tree.path("src"), tree.path("dst"));

    let config = WorkerConfig::builder(&src, &dst)
        .poll_interval(Duration::from_millis(20))
        .build();
    let shutdown = ShutdownFlag::new();
    let flag = shutdown.clone();
    let handle = thread::spawn(move || run_worker(&config, &flag));
    assert!(wait_until(DEADLINE, || dst.join("a.txt").is_file()));

    fs::rename(&src, tree.path("moved-away")).expect("move source away");
    let report = handle.join().expect("worker thread");
    assert_eq!(report.reason, StopReason::SourceRemoved);
    assert_eq!(report.exit_code(), ExitCode::Ok);
    assert!(!shutdown.is_requested());
    assert!(dst.join("a.txt").is_file());
}

#[test]
fn missing_source_fails_with_watch_error() {
    let tree = TempTree::new();
    let config = WorkerConfig::builder(tree.path("missing"), tree.path("dst")).build();
    let report = run_worker(&config, &ShutdownFlag::new());
    assert_eq!(report.reason, StopReason::Failed);
    assert_eq!(report.exit_code(), ExitCode::WatchFailed);
}

#[test]
fn unwritable_target_fails_initial_sync() {
    let tree = TempTree::new();
    tree.file("src/a.txt", b"a").file("blocker", b"not a directory");
    let config = WorkerConfig::builder(tree.path("src"), tree.path("blocker/dst")).build();
    let report = run_worker(&config, &ShutdownFlag::new());
    assert_eq!(report.exit_code(), ExitCode::InitialSync);
    assert!(matches!(report.error, Some(WorkerError::InitialSync(_))));
}

#[test]
fn builder_clamps_zero_interval() {
    let config = WorkerConfig::builder("/a", "/b")
        .poll_interval(Duration::ZERO)
        .build();
    assert_eq!(config.poll_interval(), Duration::from_millis(1));
    assert_eq!(
        WorkerConfig::builder("/a", "/b").build().poll_interval(),
        DEFAULT_POLL_INTERVAL
    );
}

#[test]
fn overflow_rebuilds_watches_and_reconciles_target() {
    let tree = TempTree::new();
    tree.file("src/a.txt", b"a").file("dst/stale.txt", b"left over");
    let (src, dst) = (tree.path("src"), tree.path("dst"));
    let config = WorkerConfig::builder(&src, &dst).build();
    let shutdown = ShutdownFlag::new();
    let mut watches = WatchSet::new(&src).expect("watch source");

    tree.file("src/late/b.txt", b"missed");
    assert!(!watches.is_watched(&src.join("late")));

    let mut worker = Worker::new(&config, &shutdown);
    assert!(worker.apply(&ChangeEvent::overflow(), &mut watches).expect("resync"));
    assert!(watches.is_watched(&src.join("late")));
    assert_eq!(snapshot(&src), snapshot(&dst));

    shutdown.request();
    assert_eq!(
        worker.apply_batch(&[ChangeEvent::overflow()], &mut watches),
        Some(StopReason::ShutdownRequested)
    );
}

#[test]
fn shutdown_before_initial_sync_exits_cleanly() {
    let tree = TempTree::new();
    tree.file("src/a.txt", b"a").file("src/d/b.txt", b"b");
    let config = WorkerConfig::builder(tree.path("src"), tree.path("dst")).build();
    let shutdown = ShutdownFlag::new();
    shutdown.request();

    let report = run_worker(&config, &shutdown);
    assert_eq!(report.reason, StopReason::ShutdownRequested);
    assert_eq!(report.exit_code(), ExitCode::Ok);
    assert!(report.error.is_none());
    assert!(!tree.path("dst/a.txt").exists());
}
