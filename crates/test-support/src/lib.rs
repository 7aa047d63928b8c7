//! Shared helpers for tests that build directory trees and compare them.
//!
//! Everything here panics on failure; it is only ever linked into tests.

#![allow(clippy::missing_panics_doc)]

use std::collections::BTreeMap;
use std::fs;
use std::os::unix::fs::{PermissionsExt, symlink};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

/// A temporary directory with a canonical root and builder-style helpers.
pub struct TempTree {
    _dir: TempDir,
    root: PathBuf,
}

impl TempTree {
    /// Creates an empty temporary tree.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create tempdir");
        let root = fs::canonicalize(dir.path()).expect("canonicalize tempdir");
        Self { _dir: dir, root }
    }

    /// Canonical root of the tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of `relative` inside the tree.
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Creates a directory (and its parents).
    pub fn dir(&self, relative: impl AsRef<Path>) -> &Self {
        fs::create_dir_all(self.path(relative)).expect("create dir");
        self
    }

    /// Writes a file, creating parent directories.
    pub fn file(&self, relative: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> &Self {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, contents).expect("write file");
        self
    }

    /// Creates a symlink at `relative` pointing at `target`.
    pub fn symlink(&self, relative: impl AsRef<Path>, target: impl AsRef<Path>) -> &Self {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        symlink(target, &path).expect("create symlink");
        self
    }

    /// Sets the permission bits of an entry.
    pub fn mode(&self, relative: impl AsRef<Path>, mode: u32) -> &Self {
        fs::set_permissions(self.path(relative), fs::Permissions::from_mode(mode))
            .expect("set permissions");
        self
    }
}

impl Drop for TempTree {
    fn drop(&mut self) {
        unlock_dirs(&self.root);
    }
}

/// Gives the owner full access to every directory below `dir` so the
/// temporary tree can be deleted even when a test left read-only directories.
fn unlock_dirs(dir: &Path) {
    let Ok(metadata) = fs::symlink_metadata(dir) else {
        return;
    };
    if !metadata.is_dir() {
        return;
    }
    let mode = metadata.permissions().mode() | 0o700;
    let _ = fs::set_permissions(dir, fs::Permissions::from_mode(mode));
    if let Ok(children) = fs::read_dir(dir) {
        for child in children.flatten() {
            unlock_dirs(&child.path());
        }
    }
}

impl Default for TempTree {
    fn default() -> Self {
        Self::new()
    }
}

/// A comparable description of one filesystem entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Node {
    /// A directory with its permission bits.
    Dir {
        /// Permission bits.
        mode: u32,
    },
    /// A regular file with its contents and permission bits.
    File {
        /// File contents.
        contents: Vec<u8>,
        /// Permission bits.
        mode: u32,
    },
    /// A symlink and the target it stores.
    Symlink {
        /// Stored link target.
        target: PathBuf,
    },
}

/// Captures every entry below `root` keyed by relative path.
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Node> {
    let mut nodes = BTreeMap::new();
    collect(root, Path::new(""), &mut nodes);
    nodes
}

fn collect(root: &Path, relative: &Path, nodes: &mut BTreeMap<PathBuf, Node>) {
    let dir = if relative.as_os_str().is_empty() {
        root.to_path_buf()
    } else {
        root.join(relative)
    };
    for entry in fs::read_dir(&dir).expect("read dir") {
        let entry = entry.expect("dir entry");
        let rel = relative.join(entry.file_name());
        let path = entry.path();
        let metadata = fs::symlink_metadata(&path).expect("lstat");
        let mode = metadata.permissions().mode() & 0o7777;
        if metadata.file_type().is_symlink() {
            let target = fs::read_link(&path).expect("read link");
            nodes.insert(rel, Node::Symlink { target });
        } else if metadata.is_dir() {
            nodes.insert(rel.clone(), Node::Dir { mode });
            collect(root, &rel, nodes);
        } else if metadata.is_file() {
            let contents = fs::read(&path).expect("read file");
            nodes.insert(rel, Node::File { contents, mode });
        }
    }
}

/// Polls `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(20));
    }
}
