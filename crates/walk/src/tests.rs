use super::*;
use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

fn collect_relative_paths(walker: Walker) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for entry in walker {
        let entry = entry.expect("walker entry");
        if entry.is_root() {
            continue;
        }
        paths.push(entry.relative_path().to_path_buf());
    }
    paths
}

#[test]
fn source_removed_before_walk_is_not_found() {
    let temp = tempfile::tempdir().expect("tempdir");
    let source = temp.path().join("photos");
    fs::create_dir(&source).expect("create");
    fs::remove_dir(&source).expect("remove");

    let error = WalkBuilder::new(&source)
        .build()
        .err()
        .expect("vanished root must fail");
    assert!(matches!(error, WalkError::RootMetadata { .. }));
    assert!(error.is_not_found());
    assert_eq!(error.path(), source);
    assert!(error.to_string().starts_with("cannot stat walk root"));
}

#[test]
fn file_root_is_its_only_entry() {
    let temp = tempfile::tempdir().expect("tempdir");
    let notes = temp.path().join("notes.txt");
    fs::write(&notes, b"remember").expect("write");

    let entries: Vec<_> = WalkBuilder::new(&notes)
        .build()
        .expect("build walker")
        .map(|entry| entry.expect("entry"))
        .collect();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].is_root());
    assert_eq!(entries[0].kind(), EntryKind::File);
    assert_eq!(entries[0].relative_path(), Path::new(""));
    assert_eq!(entries[0].metadata().len(), 8);
}

#[test]
fn parents_precede_children_in_name_order() {
    let temp = tempfile::tempdir().expect("tempdir");
    let project = temp.path();
    fs::create_dir_all(project.join("src/bin")).expect("src/bin");
    fs::create_dir(project.join("docs")).expect("docs");
    fs::write(project.join("src/bin/main.rs"), b"fn main() {}").expect("main");
    fs::write(project.join("src/lib.rs"), b"").expect("lib");
    fs::write(project.join("README"), b"").expect("readme");

    let walker = WalkBuilder::new(project).build().expect("build walker");
    assert_eq!(
        collect_relative_paths(walker),
        vec![
            PathBuf::from("README"),
            PathBuf::from("docs"),
            PathBuf::from("src"),
            PathBuf::from("src/bin"),
            PathBuf::from("src/bin/main.rs"),
            PathBuf::from("src/lib.rs"),
        ]
    );
}

#[test]
fn walk_without_root_starts_at_children() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("only.txt"), b"x").expect("write");

    let mut walker = WalkBuilder::new(temp.path())
        .include_root(false)
        .build()
        .expect("build walker");
    let first = walker.next().expect("entry").expect("entry ok");
    assert!(!first.is_root());
    assert_eq!(first.depth(), 1);
    assert_eq!(first.relative_path(), Path::new("only.txt"));
    assert!(walker.next().is_none());
}

#[test]
fn walk_reports_symlinks_without_following() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("root");
    let outside = temp.path().join("outside");
    fs::create_dir(&root).expect("create root");
    fs::create_dir(&outside).expect("create outside");
    fs::write(outside.join("hidden.txt"), b"data").expect("write");
    symlink(&outside, root.join("link")).expect("symlink");

    let walker = WalkBuilder::new(&root)
        .include_root(false)
        .build()
        .expect("build walker");
    let entries: Vec<_> = walker.map(|entry| entry.expect("entry")).collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind(), EntryKind::Symlink);
    assert_eq!(entries[0].relative_path(), Path::new("link"));
}

#[test]
fn skip_current_dir_prunes_subtree() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    fs::create_dir_all(root.join("skip/deep")).expect("create skip");
    fs::write(root.join("skip/deep/file"), b"x").expect("write");
    fs::create_dir(root.join("keep")).expect("create keep");
    fs::write(root.join("keep/file"), b"x").expect("write");

    let mut walker = WalkBuilder::new(root)
        .include_root(false)
        .build()
        .expect("build walker");
    let mut seen = Vec::new();
    while let Some(entry) = walker.next() {
        let entry = entry.expect("entry");
        if entry.relative_path() == Path::new("skip") {
            walker.skip_current_dir();
        }
        seen.push(entry.relative_path().to_path_buf());
    }

    assert_eq!(
        seen,
        vec![
            PathBuf::from("keep"),
            PathBuf::from("keep/file"),
            PathBuf::from("skip"),
        ]
    );
}

#[test]
fn removed_directory_is_skipped_after_yield() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    fs::create_dir_all(root.join("gone/inner")).expect("create");
    fs::write(root.join("z.txt"), b"x").expect("write");

    let mut walker = WalkBuilder::new(root)
        .include_root(false)
        .build()
        .expect("build walker");
    let first = walker.next().expect("entry").expect("entry ok");
    assert_eq!(first.relative_path(), Path::new("gone"));
    fs::remove_dir_all(root.join("gone")).expect("remove");

    let rest = collect_relative_paths(walker);
    assert_eq!(rest, vec![PathBuf::from("z.txt")]);
}

#[test]
fn entry_depth_tracks_nesting() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(temp.path().join("a/b")).expect("create");
    fs::write(temp.path().join("a/b/c"), b"x").expect("write");

    let depths: Vec<_> = WalkBuilder::new(temp.path())
        .build()
        .expect("build walker")
        .map(|entry| entry.expect("entry").depth())
        .collect();
    assert_eq!(depths, vec![0, 1, 2, 3]);
}

#[test]
fn directories_only_skips_files_and_symlinks() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    fs::create_dir_all(root.join("docs/drafts")).expect("dirs");
    fs::create_dir(root.join("media")).expect("media");
    fs::write(root.join("docs/readme.md"), b"#").expect("file");
    fs::write(root.join("top.txt"), b"t").expect("file");
    symlink("media", root.join("media-link")).expect("symlink");

    let walker = WalkBuilder::new(root)
        .directories_only(true)
        .build()
        .expect("build walker");
    let kinds: Vec<_> = walker
        .map(|entry| entry.expect("entry").kind())
        .collect();
    assert_eq!(kinds, vec![EntryKind::Directory; 4]);

    let walker = WalkBuilder::new(root)
        .directories_only(true)
        .include_root(false)
        .build()
        .expect("build walker");
    assert_eq!(
        collect_relative_paths(walker),
        vec![
            PathBuf::from("docs"),
            PathBuf::from("docs/drafts"),
            PathBuf::from("media"),
        ]
    );
}

#[test]
fn directories_only_on_a_file_root_yields_nothing() {
    let temp = tempfile::tempdir().expect("tempdir");
    let file = temp.path().join("lone.bin");
    fs::write(&file, b"x").expect("write");

    let walker = WalkBuilder::new(&file)
        .directories_only(true)
        .build()
        .expect("build walker");
    assert_eq!(walker.count(), 0);
}
