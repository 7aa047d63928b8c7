use std::path::PathBuf;

use crate::error::WalkError;
use crate::walker::{Walker, WalkerOptions};

/// Configures a traversal of a live directory tree.
///
/// Symlinks are reported but never followed; siblings come in byte order of
/// their names so two walks of identical trees yield identical sequences.
#[derive(Clone, Debug)]
pub struct WalkBuilder {
    root: PathBuf,
    options: WalkerOptions,
}

impl WalkBuilder {
    /// Starts a traversal description for `root`.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            options: WalkerOptions {
                include_root: true,
                directories_only: false,
            },
        }
    }

    /// Whether the root itself is yielded first. Defaults to `true`.
    #[must_use]
    pub const fn include_root(mut self, include: bool) -> Self {
        self.options.include_root = include;
        self
    }

    /// Yields directories only, as needed when placing one watch per
    /// directory. Defaults to `false`.
    #[must_use]
    pub const fn directories_only(mut self, only: bool) -> Self {
        self.options.directories_only = only;
        self
    }

    /// Inspects the root and returns the iterator.
    pub fn build(self) -> Result<Walker, WalkError> {
        Walker::new(self.root, self.options)
    }
}
