//! crates/watch/src/set.rs
//!
//! Owns the inotify descriptor and the handle-to-path table for one tree.

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::io;
use std::os::fd::AsFd;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use inotify::{EventMask, Inotify, WatchDescriptor, WatchMask};
use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use tracing::{debug, trace, warn};
use walk::WalkBuilder;

use crate::error::WatchError;
use crate::event::{ChangeEvent, ChangeKind, EventBatch};

const EVENT_BUFFER: usize = 16 * 1024;

fn watch_mask() -> WatchMask {
    WatchMask::CREATE
        | WatchMask::DELETE
        | WatchMask::MODIFY
        | WatchMask::MOVED_FROM
        | WatchMask::MOVED_TO
        | WatchMask::ATTRIB
        | WatchMask::DELETE_SELF
        | WatchMask::MOVE_SELF
        | WatchMask::CLOSE_WRITE
}

struct RawEvent {
    wd: WatchDescriptor,
    mask: EventMask,
    name: Option<OsString>,
}

/// Recursive watch over one directory tree.
///
/// Every directory under the root carries its own watch; the set maps each
/// watch handle back to the absolute directory path it was registered for.
pub struct WatchSet {
    inotify: Inotify,
    root: PathBuf,
    root_wd: Option<WatchDescriptor>,
    watches: HashMap<WatchDescriptor, PathBuf>,
    buffer: Vec<u8>,
}

impl WatchSet {
    /// Creates an inotify instance and watches `root` and all of its
    /// subdirectories.
    pub fn new(root: &Path) -> Result<Self, WatchError> {
        let inotify = Inotify::init().map_err(|source| WatchError::Init { source })?;
        let mut set = Self {
            inotify,
            root: root.to_path_buf(),
            root_wd: None,
            watches: HashMap::new(),
            buffer: vec![0u8; EVENT_BUFFER],
        };
        set.watch_root()?;
        Ok(set)
    }

    fn watch_root(&mut self) -> Result<(), WatchError> {
        let root = self.root.clone();
        let wd = self.add_watch(&root).map_err(|source| WatchError::Add {
            path: root.clone(),
            source,
        })?;
        self.root_wd = Some(wd);
        let count = self.watch_directory_tree(&root)?;
        debug!(target: "backup::watch", root = %root.display(), count, "watching tree");
        Ok(())
    }

    /// The directory this set was created for.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of directories currently under watch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.watches.len()
    }

    /// Reports whether no directory is under watch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    /// Reports whether `path` itself is under watch.
    #[must_use]
    pub fn is_watched(&self, path: &Path) -> bool {
        self.watches.values().any(|watched| watched == path)
    }

    /// Watches `dir` and every directory below it, returning how many watches
    /// were placed. Symlinks are not followed and directories that vanish
    /// during the scan are skipped.
    pub fn watch_directory_tree(&mut self, dir: &Path) -> Result<usize, WatchError> {
        let walker = match WalkBuilder::new(dir).directories_only(true).build() {
            Ok(walker) => walker,
            Err(error) if error.is_not_found() => return Ok(0),
            Err(source) => {
                return Err(WatchError::Scan {
                    path: dir.to_path_buf(),
                    source,
                });
            }
        };

        let mut added = 0usize;
        for entry in walker {
            let entry = entry.map_err(|source| WatchError::Scan {
                path: dir.to_path_buf(),
                source,
            })?;
            match self.add_watch(entry.full_path()) {
                Ok(_) => added += 1,
                Err(error) if error.kind() == io::ErrorKind::NotFound => {
                    trace!(target: "backup::watch", path = %entry.full_path().display(), "directory vanished before watch");
                }
                Err(source) => {
                    return Err(WatchError::Add {
                        path: entry.full_path().to_path_buf(),
                        source,
                    });
                }
            }
        }
        Ok(added)
    }

    fn add_watch(&mut self, path: &Path) -> io::Result<WatchDescriptor> {
        let wd = self.inotify.watches().add(path, watch_mask())?;
        trace!(target: "backup::watch", path = %path.display(), "watch added");
        self.watches.insert(wd.clone(), path.to_path_buf());
        Ok(wd)
    }

    /// Drops the watches for `dir` and everything below it.
    pub fn unwatch_tree(&mut self, dir: &Path) {
        let doomed: Vec<WatchDescriptor> = self
            .watches
            .iter()
            .filter(|(_, path)| paths::is_subpath(dir, path))
            .map(|(wd, _)| wd.clone())
            .collect();
        for wd in doomed {
            if self.root_wd.as_ref() == Some(&wd) {
                self.root_wd = None;
            }
            if let Some(path) = self.watches.remove(&wd) {
                trace!(target: "backup::watch", path = %path.display(), "watch removed");
            }
            // The kernel may already have dropped the watch.
            let _ = self.inotify.watches().remove(wd);
        }
    }

    /// Drops every watch and rebuilds them from the root.
    pub fn rewatch(&mut self) -> Result<(), WatchError> {
        let root = self.root.clone();
        self.unwatch_tree(&root);
        self.watch_root()
    }

    /// Waits until events arrive or shutdown is requested.
    ///
    /// The descriptor is polled with `poll_interval` as timeout and `shutdown`
    /// is checked between waits, so a request is observed within one
    /// interval.
    pub fn next_events(
        &mut self,
        shutdown: &AtomicBool,
        poll_interval: Duration,
    ) -> Result<EventBatch, WatchError> {
        loop {
            if shutdown.load(Ordering::Acquire) {
                return Ok(EventBatch::Shutdown);
            }
            let events = self.poll_events(poll_interval)?;
            if !events.is_empty() {
                return Ok(EventBatch::Events(events));
            }
        }
    }

    /// Performs a single wait of at most `timeout` and returns whatever
    /// events were classified, possibly none.
    pub fn poll_events(&mut self, timeout: Duration) -> Result<Vec<ChangeEvent>, WatchError> {
        if !self.wait_readable(timeout)? {
            return Ok(Vec::new());
        }
        let raw = self.drain()?;
        let mut events = Vec::with_capacity(raw.len());
        for event in raw {
            self.classify(event, &mut events);
        }
        Ok(events)
    }

    fn wait_readable(&self, timeout: Duration) -> Result<bool, WatchError> {
        let millis = u16::try_from(timeout.as_millis()).unwrap_or(u16::MAX);
        let mut fds = [PollFd::new(self.inotify.as_fd(), PollFlags::POLLIN)];
        match poll(&mut fds, PollTimeout::from(millis)) {
            Ok(0) | Err(Errno::EINTR) => Ok(false),
            Ok(_) => Ok(true),
            Err(errno) => Err(WatchError::Channel {
                source: io::Error::from(errno),
            }),
        }
    }

    fn drain(&mut self) -> Result<Vec<RawEvent>, WatchError> {
        let mut raw = Vec::new();
        loop {
            match self.inotify.read_events(&mut self.buffer) {
                Ok(events) => {
                    let before = raw.len();
                    raw.extend(events.map(|event| RawEvent {
                        wd: event.wd,
                        mask: event.mask,
                        name: event.name.map(OsStr::to_os_string),
                    }));
                    if raw.len() == before {
                        break;
                    }
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => break,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(source) => return Err(WatchError::Channel { source }),
            }
        }
        Ok(raw)
    }

    fn classify(&mut self, event: RawEvent, out: &mut Vec<ChangeEvent>) {
        let mask = event.mask;
        if mask.contains(EventMask::Q_OVERFLOW) {
            warn!(target: "backup::watch", root = %self.root.display(), "event queue overflowed");
            out.push(ChangeEvent::overflow());
            return;
        }

        let Some(dir) = self.watches.get(&event.wd).cloned() else {
            trace!(target: "backup::watch", ?mask, "event for unknown watch dropped");
            return;
        };
        let is_root = self.root_wd.as_ref() == Some(&event.wd);

        if mask.contains(EventMask::IGNORED) {
            self.watches.remove(&event.wd);
            if is_root {
                self.root_wd = None;
            }
            out.push(ChangeEvent::new(ChangeKind::Ignored, dir, true));
            return;
        }

        if mask.intersects(EventMask::DELETE_SELF | EventMask::MOVE_SELF) {
            if is_root {
                out.push(ChangeEvent::new(ChangeKind::SelfRemoved, dir, true));
            }
            return;
        }

        let is_dir = mask.contains(EventMask::ISDIR);
        let path = match event.name {
            Some(name) => dir.join(name),
            None => dir,
        };

        let kind = if mask.intersects(EventMask::DELETE | EventMask::MOVED_FROM) {
            if is_dir {
                self.unwatch_tree(&path);
            }
            ChangeKind::Removed
        } else if mask.intersects(EventMask::CREATE | EventMask::MOVED_TO) {
            ChangeKind::Created
        } else if mask.intersects(EventMask::MODIFY | EventMask::ATTRIB | EventMask::CLOSE_WRITE) {
            ChangeKind::Modified
        } else {
            return;
        };
        trace!(target: "backup::watch", ?kind, path = %path.display(), is_dir, "change");
        out.push(ChangeEvent::new(kind, path, is_dir));
    }

    /// Releases every watch and closes the descriptor.
    pub fn close(self) -> Result<(), WatchError> {
        debug!(target: "backup::watch", root = %self.root.display(), "closing watcher");
        self.inotify
            .close()
            .map_err(|source| WatchError::Channel { source })
    }
}
