use super::*;
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use test_support::TempTree;

const WAIT: Duration = Duration::from_millis(50);

/// Collects events until `done` is satisfied or a few seconds pass.
fn collect_until(set: &mut WatchSet, mut done: impl FnMut(&[ChangeEvent]) -> bool) -> Vec<ChangeEvent> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut seen = Vec::new();
    while Instant::now() < deadline {
        seen.extend(set.poll_events(WAIT).expect("poll events"));
        if done(&seen) {
            break;
        }
    }
    seen
}

fn has(events: &[ChangeEvent], kind: ChangeKind, path: &Path) -> bool {
    events.iter().any(|event| event.kind() == kind && event.path() == path)
}

#[test]
fn watches_every_existing_directory() {
    let tree = TempTree::new();
    tree.dir("src/a/b").dir("src/c").file("src/f.txt", b"x");

    let set = WatchSet::new(&tree.path("src")).expect("watch");
    assert_eq!(set.len(), 4);
    assert!(set.is_watched(&tree.path("src/a/b")));
    assert!(!set.is_watched(&tree.path("src/f.txt")));
}

#[test]
fn reports_created_modified_and_removed_files() {
    let tree = TempTree::new();
    tree.dir("src");
    let mut set = WatchSet::new(&tree.path("src")).expect("watch");
    let file = tree.path("src/a.txt");

    fs::write(&file, b"12345").expect("write");
    let events = collect_until(&mut set, |events| has(events, ChangeKind::Modified, &file));
    assert!(has(&events, ChangeKind::Created, &file));
    assert!(has(&events, ChangeKind::Modified, &file));

    fs::remove_file(&file).expect("remove");
    let events = collect_until(&mut set, |events| has(events, ChangeKind::Removed, &file));
    assert!(has(&events, ChangeKind::Removed, &file));
}

#[test]
fn nested_directory_events_carry_full_paths() {
    let tree = TempTree::new();
    tree.dir("src/deep/er");
    let mut set = WatchSet::new(&tree.path("src")).expect("watch");
    let file = tree.path("src/deep/er/x.bin");

    fs::write(&file, b"x").expect("write");
    let events = collect_until(&mut set, |events| has(events, ChangeKind::Created, &file));
    assert!(has(&events, ChangeKind::Created, &file));
}

#[test]
fn removing_directory_drops_subtree_watches() {
    let tree = TempTree::new();
    tree.dir("src/gone/inner").dir("src/kept");
    let mut set = WatchSet::new(&tree.path("src")).expect("watch");
    assert_eq!(set.len(), 4);

    let gone = tree.path("src/gone");
    fs::remove_dir_all(&gone).expect("remove");
    let events = collect_until(&mut set, |events| has(events, ChangeKind::Removed, &gone));
    assert!(has(&events, ChangeKind::Removed, &gone));
    assert!(!set.is_watched(&gone));
    assert!(!set.is_watched(&tree.path("src/gone/inner")));
    assert!(set.is_watched(&tree.path("src/kept")));
}

#[test]
fn new_directories_can_be_added_dynamically() {
    let tree = TempTree::new();
    tree.dir("src");
    let mut set = WatchSet::new(&tree.path("src")).expect("watch");
    let fresh = tree.path("src/fresh");

    fs::create_dir_all(fresh.join("sub")).expect("mkdir");
    let events = collect_until(&mut set, |events| has(events, ChangeKind::Created, &fresh));
    let created = events
        .iter()
        .find(|event| event.path() == fresh)
        .expect("created event");
    assert!(created.is_dir());

    assert_eq!(set.watch_directory_tree(&fresh).expect("watch fresh"), 2);
    let file = fresh.join("sub/later.txt");
    fs::write(&file, b"later").expect("write");
    let events = collect_until(&mut set, |events| has(events, ChangeKind::Created, &file));
    assert!(has(&events, ChangeKind::Created, &file));
}

#[test]
fn root_removal_is_reported_once() {
    let tree = TempTree::new();
    tree.dir("src/child");
    let root = tree.path("src");
    let mut set = WatchSet::new(&root).expect("watch");

    fs::remove_dir_all(&root).expect("remove root");
    let events = collect_until(&mut set, |events| has(events, ChangeKind::SelfRemoved, &root));
    let self_removed = events
        .iter()
        .filter(|event| event.kind() == ChangeKind::SelfRemoved)
        .count();
    assert_eq!(self_removed, 1);
}

#[test]
fn next_events_returns_shutdown_when_flag_set() {
    let tree = TempTree::new();
    tree.dir("src");
    let mut set = WatchSet::new(&tree.path("src")).expect("watch");
    let shutdown = AtomicBool::new(true);

    let batch = set.next_events(&shutdown, WAIT).expect("next events");
    assert!(matches!(batch, EventBatch::Shutdown));
    set.close().expect("close");
}

#[test]
fn missing_root_fails_to_watch() {
    let tree = TempTree::new();
    let error = match WatchSet::new(&tree.path("missing")) {
        Ok(_) => panic!("missing root should fail"),
        Err(error) => error,
    };
    assert!(matches!(error, WatchError::Add { .. }));
}
