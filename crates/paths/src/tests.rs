use super::*;
use std::fs;
use std::os::unix::fs::{PermissionsExt, symlink};
use std::path::{Path, PathBuf};

fn canonical_tempdir() -> (tempfile::TempDir, PathBuf) {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = fs::canonicalize(temp.path()).expect("canonical tempdir");
    (temp, root)
}

#[test]
fn canonicalize_resolves_existing_symlinks() {
    let (_temp, root) = canonical_tempdir();
    let real = root.join("real");
    fs::create_dir(&real).expect("create real");
    symlink(&real, root.join("alias")).expect("symlink");

    let resolved = canonicalize(&root.join("alias")).expect("canonicalize");
    assert_eq!(resolved, real);
}

#[test]
fn canonicalize_appends_missing_leaf_to_resolved_parent() {
    let (_temp, root) = canonical_tempdir();
    let real = root.join("real");
    fs::create_dir(&real).expect("create real");
    symlink(&real, root.join("alias")).expect("symlink");

    let resolved = canonicalize(&root.join("alias/new-target")).expect("canonicalize");
    assert_eq!(resolved, real.join("new-target"));
}

#[test]
fn canonicalize_handles_missing_chain_and_dot_segments() {
    let (_temp, root) = canonical_tempdir();
    let requested = root.join("a/b/../c/./d/");
    let resolved = canonicalize(&requested).expect("canonicalize");
    assert_eq!(resolved, root.join("a/c/d"));
}

#[test]
fn canonicalize_ignores_trailing_slash() {
    let (_temp, root) = canonical_tempdir();
    let dir = root.join("dir");
    fs::create_dir(&dir).expect("create dir");

    let with_slash = PathBuf::from(format!("{}/", dir.display()));
    assert_eq!(canonicalize(&with_slash).expect("canonicalize"), dir);
}

#[test]
fn validate_source_rejects_missing_and_files() {
    let (_temp, root) = canonical_tempdir();
    let missing = validate_source(&root.join("missing")).expect_err("missing source");
    assert!(matches!(missing, PathError::NotFound { .. }));

    let file = root.join("file.txt");
    fs::write(&file, b"data").expect("write");
    let not_dir = validate_source(&file).expect_err("file source");
    assert!(matches!(not_dir, PathError::NotADirectory { .. }));
    assert_eq!(not_dir.path(), file);
}

#[test]
fn validate_target_creates_missing_chain() {
    let (_temp, root) = canonical_tempdir();
    let target = root.join("backup/nested/proj");

    let resolved = validate_target(&target).expect("validate target");
    assert_eq!(resolved, target);
    let metadata = fs::metadata(&target).expect("target created");
    assert!(metadata.is_dir());
    assert_eq!(metadata.permissions().mode() & 0o700, 0o700);
}

#[test]
fn validate_target_requires_empty_directory() {
    let (_temp, root) = canonical_tempdir();
    let target = root.join("backup");
    fs::create_dir(&target).expect("create target");
    assert_eq!(validate_target(&target).expect("empty target"), target);

    fs::write(target.join("stale.txt"), b"old").expect("write");
    let error = validate_target(&target).expect_err("non-empty target");
    assert!(matches!(error, PathError::NotEmpty { .. }));
}

#[test]
fn validate_target_rejects_regular_file() {
    let (_temp, root) = canonical_tempdir();
    let file = root.join("file");
    fs::write(&file, b"x").expect("write");
    let error = validate_target(&file).expect_err("file target");
    assert!(matches!(error, PathError::NotADirectory { .. }));
}

#[test]
fn is_subpath_is_component_wise() {
    let parent = Path::new("/data/proj");
    assert!(is_subpath(parent, Path::new("/data/proj")));
    assert!(is_subpath(parent, Path::new("/data/proj/sub/deeper")));
    assert!(!is_subpath(parent, Path::new("/data/projects")));
    assert!(!is_subpath(parent, Path::new("/data")));
}

#[test]
fn ensure_not_nested_rejects_child_of_source() {
    let error = ensure_not_nested(Path::new("/data/proj"), Path::new("/data/proj/sub"))
        .expect_err("nested target");
    assert!(matches!(error, PathError::Nested { .. }));
    assert!(error.to_string().contains("inside source"));
    ensure_not_nested(Path::new("/data/proj"), Path::new("/backup/proj1")).expect("sibling");
}

#[test]
fn relocate_maps_root_and_children() {
    let from = Path::new("/src");
    let to = Path::new("/dst");
    assert_eq!(relocate(from, from, to), Some(PathBuf::from("/dst")));
    assert_eq!(
        relocate(Path::new("/src/a/b"), from, to),
        Some(PathBuf::from("/dst/a/b"))
    );
    assert_eq!(relocate(Path::new("/other/a"), from, to), None);
}

#[test]
fn relative_paths_resolve_against_current_directory() {
    let cwd = std::env::current_dir().expect("cwd");
    let expected = fs::canonicalize(&cwd).expect("canonical cwd").join("not-yet-created");
    assert_eq!(
        canonicalize(Path::new("not-yet-created")).expect("canonicalize"),
        expected
    );
}
