use crate::entry::WalkEntry;
use crate::error::WalkError;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::trace;

#[derive(Clone, Copy, Debug)]
pub(crate) struct WalkerOptions {
    pub(crate) include_root: bool,
    pub(crate) directories_only: bool,
}

/// Depth-first iterator over filesystem entries.
///
/// Entries that disappear between being listed and being inspected are
/// skipped, since the trees being walked are live.
pub struct Walker {
    root: PathBuf,
    root_entry: Option<WalkEntry>,
    directories_only: bool,
    stack: Vec<OpenDir>,
    pending_descent: Option<(PathBuf, PathBuf, usize)>,
    finished: bool,
}

impl Walker {
    pub(crate) fn new(root: PathBuf, options: WalkerOptions) -> Result<Self, WalkError> {
        let root = absolutize(root)?;
        trace!(target: "backup::walk", root = %root.display(), "starting traversal");

        let metadata = fs::symlink_metadata(&root).map_err(|source| WalkError::RootMetadata {
            path: root.clone(),
            source,
        })?;
        let pending_descent = metadata
            .is_dir()
            .then(|| (root.clone(), PathBuf::new(), 0));
        let wanted = options.include_root && (metadata.is_dir() || !options.directories_only);
        let root_entry = wanted.then(|| WalkEntry {
            full_path: root.clone(),
            relative_path: PathBuf::new(),
            metadata,
            depth: 0,
            is_root: true,
        });

        Ok(Self {
            root,
            root_entry,
            directories_only: options.directories_only,
            stack: Vec::new(),
            pending_descent,
            finished: false,
        })
    }

    /// Returns the absolute traversal root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Prevents the walker from descending into the directory it yielded last.
    ///
    /// Has no effect when the last entry was not a directory.
    pub fn skip_current_dir(&mut self) {
        self.pending_descent = None;
    }

    fn descend(&mut self) -> Result<(), WalkError> {
        let Some((dir, prefix, depth)) = self.pending_descent.take() else {
            return Ok(());
        };
        match OpenDir::list(dir, prefix, depth) {
            Ok(open) => {
                self.stack.push(open);
                Ok(())
            }
            Err(error) if error.is_not_found() => {
                trace!(target: "backup::walk", path = %error.path().display(), "directory vanished");
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    fn prepare_entry(
        &mut self,
        full_path: PathBuf,
        relative_path: PathBuf,
        depth: usize,
    ) -> Result<Option<WalkEntry>, WalkError> {
        let metadata = match fs::symlink_metadata(&full_path) {
            Ok(metadata) => metadata,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                trace!(target: "backup::walk", path = %full_path.display(), "entry vanished");
                return Ok(None);
            }
            Err(source) => {
                return Err(WalkError::Metadata {
                    path: full_path,
                    source,
                });
            }
        };

        if metadata.is_dir() {
            self.pending_descent = Some((full_path.clone(), relative_path.clone(), depth));
        } else if self.directories_only {
            return Ok(None);
        }

        Ok(Some(WalkEntry {
            full_path,
            relative_path,
            metadata,
            depth,
            is_root: false,
        }))
    }

    fn fail(&mut self, error: WalkError) -> Option<Result<WalkEntry, WalkError>> {
        self.finished = true;
        Some(Err(error))
    }
}

impl Iterator for Walker {
    type Item = Result<WalkEntry, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if let Some(root) = self.root_entry.take() {
            return Some(Ok(root));
        }

        loop {
            if let Err(error) = self.descend() {
                return self.fail(error);
            }
            let open = self.stack.last_mut()?;
            let Some(name) = open.names.next() else {
                self.stack.pop();
                continue;
            };
            let (full_path, relative_path) = (open.dir.join(&name), open.prefix.join(&name));
            let depth = open.depth + 1;

            match self.prepare_entry(full_path, relative_path, depth) {
                Ok(Some(entry)) => return Some(Ok(entry)),
                Ok(None) => {}
                Err(error) => return self.fail(error),
            }
        }
    }
}

/// A directory whose children are being yielded.
#[derive(Debug)]
struct OpenDir {
    dir: PathBuf,
    prefix: PathBuf,
    depth: usize,
    names: std::vec::IntoIter<OsString>,
}

impl OpenDir {
    fn list(dir: PathBuf, prefix: PathBuf, depth: usize) -> Result<Self, WalkError> {
        let listing = fs::read_dir(&dir).map_err(|source| WalkError::ReadDir {
            path: dir.clone(),
            source,
        })?;
        let mut names = listing
            .map(|child| child.map(|child| child.file_name()))
            .collect::<io::Result<Vec<_>>>()
            .map_err(|source| WalkError::ReadDirEntry {
                path: dir.clone(),
                source,
            })?;
        names.sort_unstable();
        trace!(target: "backup::walk", path = %dir.display(), children = names.len(), "listed directory");

        Ok(Self {
            dir,
            prefix,
            depth,
            names: names.into_iter(),
        })
    }
}

fn absolutize(root: PathBuf) -> Result<PathBuf, WalkError> {
    if root.is_absolute() {
        return Ok(root);
    }
    env::current_dir()
        .map(|cwd| cwd.join(root))
        .map_err(|source| WalkError::CurrentDir { source })
}
