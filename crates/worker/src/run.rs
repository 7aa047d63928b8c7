//! crates/worker/src/run.rs
//!
//! The process-independent worker loop.

use std::fs;
use std::path::Path;

use engine::{
    CopyError, CopyRoots, copy_entry, remove_path, sync_directory_permissions, sync_tree,
};
use tracing::{debug, error, info, warn};
use watch::{ChangeEvent, ChangeKind, EventBatch, WatchSet};

use crate::{ExitCode, ShutdownFlag, WorkerConfig, WorkerError, WorkerState};

/// Why the watch loop ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StopReason {
    /// The shutdown flag was raised.
    ShutdownRequested,
    /// The source directory itself was deleted or moved away.
    SourceRemoved,
    /// A fatal error ended the worker.
    Failed,
}

/// Summary of a finished worker run.
#[derive(Debug)]
pub struct WorkerReport {
    /// Final lifecycle state, always [`WorkerState::Terminated`].
    pub state: WorkerState,
    /// Why the worker stopped.
    pub reason: StopReason,
    /// Events replayed onto the target.
    pub applied: u64,
    /// Events that could not be replayed and were skipped.
    pub skipped: u64,
    /// Fatal error, when [`StopReason::Failed`].
    pub error: Option<WorkerError>,
}

impl WorkerReport {
    /// Exit status the worker process should report.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        self.error.as_ref().map_or(ExitCode::Ok, WorkerError::exit_code)
    }
}

pub(crate) struct Worker<'a> {
    config: &'a WorkerConfig,
    shutdown: &'a ShutdownFlag,
    roots: CopyRoots,
    state: WorkerState,
    applied: u64,
    skipped: u64,
}

impl<'a> Worker<'a> {
    pub(crate) fn new(config: &'a WorkerConfig, shutdown: &'a ShutdownFlag) -> Self {
        Self {
            config,
            shutdown,
            roots: CopyRoots::new(config.source(), config.target()),
            state: WorkerState::Starting,
            applied: 0,
            skipped: 0,
        }
    }

    fn transition(&mut self, next: WorkerState) {
        debug!(
            target: "backup::worker",
            source = %self.config.source().display(),
            target_dir = %self.config.target().display(),
            from = %self.state,
            to = %next,
            "state change"
        );
        self.state = next;
    }

    fn finish(mut self, reason: StopReason, error: Option<WorkerError>) -> WorkerReport {
        if self.state != WorkerState::Terminating {
            self.transition(WorkerState::Terminating);
        }
        self.transition(WorkerState::Terminated);
        WorkerReport {
            state: self.state,
            reason,
            applied: self.applied,
            skipped: self.skipped,
            error,
        }
    }

    pub(crate) fn apply_batch(
        &mut self,
        events: &[ChangeEvent],
        watches: &mut WatchSet,
    ) -> Option<StopReason> {
        let mut previous: Option<&ChangeEvent> = None;
        for event in events {
            if previous == Some(event) {
                continue;
            }
            previous = Some(event);

            if self.shutdown.is_requested() {
                return Some(StopReason::ShutdownRequested);
            }
            if event.kind() == ChangeKind::SelfRemoved {
                info!(
                    target: "backup::worker",
                    source = %self.config.source().display(),
                    "source removed, stopping"
                );
                return Some(StopReason::SourceRemoved);
            }

            match self.apply(event, watches) {
                Ok(true) => self.applied += 1,
                Ok(false) => {}
                Err(error) if error.is_cancelled() => return Some(StopReason::ShutdownRequested),
                Err(error) if error.is_not_found() => {
                    debug!(target: "backup::worker", %error, "entry vanished before it was mirrored");
                }
                Err(error) => {
                    self.skipped += 1;
                    warn!(target: "backup::worker", %error, path = %event.path().display(), "skipping change");
                }
            }
        }
        None
    }

    /// Replays one event onto the target. Returns whether anything was done.
    ///
    /// An overflow means changes were lost: the watches are rebuilt and the
    /// whole target is reconciled with the source.
    pub(crate) fn apply(
        &self,
        event: &ChangeEvent,
        watches: &mut WatchSet,
    ) -> Result<bool, CopyError> {
        if event.kind() == ChangeKind::Overflow {
            if let Err(error) = watches.rewatch() {
                warn!(target: "backup::worker", %error, "failed to rebuild watches after overflow");
            }
            sync_tree(self.config.source(), self.config.target(), self.shutdown.as_atomic())?;
            return Ok(true);
        }

        let src = event.path();
        let Some(dst) = paths::relocate(src, self.config.source(), self.config.target()) else {
            return Ok(false);
        };

        match event.kind() {
            ChangeKind::Removed => {
                remove_path(&dst)?;
                Ok(true)
            }
            ChangeKind::Created => {
                if lstat_is_dir(src)? {
                    if let Err(error) = watches.watch_directory_tree(src) {
                        warn!(target: "backup::worker", %error, "new directory is not watched");
                    }
                }
                copy_entry(src, &dst, &self.roots)?;
                Ok(true)
            }
            ChangeKind::Modified => {
                if lstat_is_dir(src)? && dst.is_dir() {
                    sync_directory_permissions(src, &dst)?;
                } else {
                    copy_entry(src, &dst, &self.roots)?;
                }
                Ok(true)
            }
            ChangeKind::Ignored | ChangeKind::SelfRemoved | ChangeKind::Overflow => Ok(false),
        }
    }
}

fn lstat_is_dir(path: &Path) -> Result<bool, CopyError> {
    fs::symlink_metadata(path)
        .map(|metadata| metadata.is_dir())
        .map_err(|error| CopyError::io("inspect", path, error))
}

/// Runs one worker until shutdown is requested, the source disappears or a
/// fatal error occurs.
///
/// Watches are placed before the initial copy so that changes made while the
/// copy runs are replayed afterwards. The shutdown flag is also honoured
/// during the initial copy, which then ends early without an error.
pub fn run_worker(config: &WorkerConfig, shutdown: &ShutdownFlag) -> WorkerReport {
    let mut worker = Worker::new(config, shutdown);
    info!(
        target: "backup::worker",
        source = %config.source().display(),
        target_dir = %config.target().display(),
        "worker starting"
    );

    worker.transition(WorkerState::InitialSync);
    let mut watches = match WatchSet::new(config.source()) {
        Ok(watches) => watches,
        Err(error) => {
            error!(target: "backup::worker", %error, "cannot watch source");
            return worker.finish(StopReason::Failed, Some(WorkerError::Watch(error)));
        }
    };
    match sync_tree(config.source(), config.target(), shutdown.as_atomic()) {
        Ok(_) => {}
        Err(error) if error.is_cancelled() => {
            info!(target: "backup::worker", "shutdown requested during initial synchronisation");
            if let Err(error) = watches.close() {
                warn!(target: "backup::worker", %error, "failed to release watches");
            }
            return worker.finish(StopReason::ShutdownRequested, None);
        }
        Err(error) => {
            error!(target: "backup::worker", %error, "initial synchronisation failed");
            return worker.finish(StopReason::Failed, Some(WorkerError::InitialSync(error)));
        }
    }

    worker.transition(WorkerState::Watching);
    let outcome = loop {
        match watches.next_events(shutdown.as_atomic(), config.poll_interval()) {
            Ok(EventBatch::Shutdown) => break Ok(StopReason::ShutdownRequested),
            Ok(EventBatch::Events(events)) => {
                if let Some(reason) = worker.apply_batch(&events, &mut watches) {
                    break Ok(reason);
                }
            }
            Err(error) => break Err(error),
        }
    };

    worker.transition(WorkerState::Terminating);
    if let Err(error) = watches.close() {
        warn!(target: "backup::worker", %error, "failed to release watches");
    }
    match outcome {
        Ok(reason) => {
            info!(
                target: "backup::worker",
                source = %config.source().display(),
                ?reason,
                applied = worker.applied,
                skipped = worker.skipped,
                "worker stopped"
            );
            worker.finish(reason, None)
        }
        Err(error) => {
            error!(target: "backup::worker", %error, "watch loop failed");
            worker.finish(StopReason::Failed, Some(WorkerError::Watch(error)))
        }
    }
}
