use std::path::{Path, PathBuf};

/// What happened to a watched path.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChangeKind {
    /// An entry appeared, either freshly created or moved in.
    Created,
    /// File contents, attributes or a completed write changed.
    Modified,
    /// An entry was deleted or moved away.
    Removed,
    /// The watched root itself was deleted or moved.
    SelfRemoved,
    /// The kernel dropped a watch, typically after its directory went away.
    Ignored,
    /// The event queue overflowed and changes were lost.
    Overflow,
}

/// A classified filesystem change with the absolute path it concerns.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChangeEvent {
    kind: ChangeKind,
    path: PathBuf,
    is_dir: bool,
}

impl ChangeEvent {
    pub(crate) fn new(kind: ChangeKind, path: PathBuf, is_dir: bool) -> Self {
        Self { kind, path, is_dir }
    }

    /// A [`ChangeKind::Overflow`] event, as the watcher emits when the kernel
    /// queue overflowed. Handing one to a consumer forces a full rescan.
    #[must_use]
    pub fn overflow() -> Self {
        Self::new(ChangeKind::Overflow, PathBuf::new(), false)
    }

    /// The change classification.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// Absolute path in the watched tree. Empty for [`ChangeKind::Overflow`].
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the kernel flagged the subject as a directory.
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        self.is_dir
    }
}

/// Result of one wait on the watcher.
#[derive(Debug)]
pub enum EventBatch {
    /// Shutdown was requested while waiting.
    Shutdown,
    /// One or more classified changes, in kernel order.
    Events(Vec<ChangeEvent>),
}
