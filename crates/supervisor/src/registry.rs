//! crates/supervisor/src/registry.rs
//!
//! Book-keeping of every source -> target pair and its worker.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::RestoreSummary;
use paths::PathError;
use tracing::{debug, info, warn};

use crate::error::RegistryError;
use crate::launcher::{WorkerExit, WorkerHandle, WorkerLauncher};

type PairKey = (PathBuf, PathBuf);

/// One source -> target pair known to the registry.
#[derive(Debug)]
pub struct BackupEntry {
    source: PathBuf,
    target: PathBuf,
    worker: Option<Box<dyn WorkerHandle>>,
}

impl BackupEntry {
    /// Canonical source directory.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Canonical target directory.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Whether a worker is currently serving the pair.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.worker.is_some()
    }

    /// Id of the serving worker, if any.
    #[must_use]
    pub fn worker_id(&self) -> Option<u32> {
        self.worker.as_ref().map(|worker| worker.id())
    }

    /// Stops the worker, if any, and waits for it.
    fn stop(&mut self) -> Option<WorkerExit> {
        let mut worker = self.worker.take()?;
        if let Err(error) = worker.terminate() {
            warn!(target: "backup::registry", %error, pid = worker.id(), "failed to signal worker");
        }
        match worker.wait() {
            Ok(exit) => {
                debug!(target: "backup::registry", pid = worker.id(), %exit, "worker stopped");
                Some(exit)
            }
            Err(error) => {
                warn!(target: "backup::registry", %error, pid = worker.id(), "failed to reap worker");
                None
            }
        }
    }
}

/// A worker started by [`Registry::add`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Started {
    /// Canonical source directory.
    pub source: PathBuf,
    /// Canonical target directory.
    pub target: PathBuf,
    /// Whether an ended pair was resumed rather than created.
    pub reactivated: bool,
}

/// Result of ending one pair.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EndOutcome {
    /// The worker was stopped; the pair is kept as inactive.
    Stopped {
        /// Canonical source directory.
        source: PathBuf,
        /// Canonical target directory.
        target: PathBuf,
    },
    /// No active backup matches the pair.
    NotFound {
        /// Source as resolved (or as typed when unresolvable).
        source: PathBuf,
        /// Target as resolved (or as typed when unresolvable).
        target: PathBuf,
    },
}

/// One row of [`Registry::list`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PairStatus {
    /// Canonical source directory.
    pub source: PathBuf,
    /// Canonical target directory.
    pub target: PathBuf,
    /// Id of the serving worker.
    pub worker_id: Option<u32>,
}

/// Snapshot of the registry, ordered by source then target.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Listing {
    /// Pairs with a running worker.
    pub active: Vec<PairStatus>,
    /// Pairs that were ended and may be resumed.
    pub inactive: Vec<PairStatus>,
}

impl Listing {
    /// Whether no pair is active.
    #[must_use]
    pub fn has_active(&self) -> bool {
        !self.active.is_empty()
    }
}

/// A worker that finished on its own, observed by [`Registry::reap`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReapEvent {
    /// Clean exit; the pair is kept as inactive.
    Finished {
        /// Canonical source directory.
        source: PathBuf,
        /// Canonical target directory.
        target: PathBuf,
    },
    /// Failed exit; the pair was removed.
    Failed {
        /// Canonical source directory.
        source: PathBuf,
        /// Canonical target directory.
        target: PathBuf,
        /// How the worker ended.
        exit: WorkerExit,
    },
}

enum Planned {
    New(PathBuf),
    Reactivate(PathBuf),
}

/// Owns every backup pair and the workers serving them.
///
/// Only the thread driving the shell touches the registry, so it needs no
/// locking. Dropping it stops all workers.
pub struct Registry<L: WorkerLauncher> {
    launcher: L,
    entries: BTreeMap<PairKey, BackupEntry>,
}

impl<L: WorkerLauncher> Registry<L> {
    /// Creates an empty registry that starts workers through `launcher`.
    pub fn new(launcher: L) -> Self {
        Self {
            launcher,
            entries: BTreeMap::new(),
        }
    }

    /// Looks up a pair by canonical paths.
    #[must_use]
    pub fn get(&self, source: &Path, target: &Path) -> Option<&BackupEntry> {
        self.entries.get(&(source.to_path_buf(), target.to_path_buf()))
    }

    /// Number of known pairs, active or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Starts backing up `source` into each of `targets`.
    ///
    /// Every operand is validated before anything is created or started: the
    /// source must be a directory, each target must lie outside the source,
    /// must not already be served, and must be empty or missing. Ended pairs
    /// are resumed with a fresh worker and keep their previous mirror.
    pub fn add(&mut self, source: &Path, targets: &[PathBuf]) -> Result<Vec<Started>, RegistryError> {
        let source = paths::validate_source(source)?;

        let mut seen = HashSet::new();
        let mut plan = Vec::with_capacity(targets.len());
        for target in targets {
            let target = paths::canonicalize(target)?;
            paths::ensure_not_nested(&source, &target)?;
            if !seen.insert(target.clone()) {
                return Err(RegistryError::DuplicateTarget { target });
            }
            match self.entries.get(&(source.clone(), target.clone())) {
                Some(entry) if entry.is_active() => {
                    return Err(RegistryError::AlreadyActive {
                        source_root: source,
                        target,
                    });
                }
                Some(_) => plan.push(Planned::Reactivate(target)),
                None => {
                    if self.target_in_use(&target) {
                        return Err(RegistryError::TargetInUse { target });
                    }
                    check_target_usable(&target)?;
                    plan.push(Planned::New(target));
                }
            }
        }

        let mut started = Vec::with_capacity(plan.len());
        for planned in plan {
            let (target, reactivated) = match planned {
                Planned::New(target) => (paths::validate_target(&target)?, false),
                Planned::Reactivate(target) => (target, true),
            };
            let worker = self
                .launcher
                .launch(&source, &target)
                .map_err(|error| RegistryError::Launch {
                    target: target.clone(),
                    source: error,
                })?;
            info!(
                target: "backup::registry",
                source = %source.display(),
                target_dir = %target.display(),
                pid = worker.id(),
                reactivated,
                "backup started"
            );
            let key = (source.clone(), target.clone());
            self.entries
                .entry(key)
                .or_insert_with(|| BackupEntry {
                    source: source.clone(),
                    target: target.clone(),
                    worker: None,
                })
                .worker = Some(worker);
            started.push(Started {
                source: source.clone(),
                target,
                reactivated,
            });
        }
        Ok(started)
    }

    fn target_in_use(&self, target: &Path) -> bool {
        self.entries
            .values()
            .any(|entry| entry.is_active() && entry.target == target)
    }

    /// Stops the workers serving `source` -> each of `targets`.
    pub fn end(&mut self, source: &Path, targets: &[PathBuf]) -> Vec<EndOutcome> {
        let source = paths::canonicalize(source).unwrap_or_else(|_| source.to_path_buf());
        targets
            .iter()
            .map(|target| {
                let target = paths::canonicalize(target).unwrap_or_else(|_| target.clone());
                let key = (source.clone(), target.clone());
                match self.entries.get_mut(&key) {
                    Some(entry) if entry.is_active() => {
                        entry.stop();
                        info!(
                            target: "backup::registry",
                            source = %source.display(),
                            target_dir = %target.display(),
                            "backup stopped"
                        );
                        EndOutcome::Stopped {
                            source: source.clone(),
                            target,
                        }
                    }
                    _ => EndOutcome::NotFound {
                        source: source.clone(),
                        target,
                    },
                }
            })
            .collect()
    }

    /// Lists active pairs, then inactive ones.
    #[must_use]
    pub fn list(&self) -> Listing {
        let mut listing = Listing::default();
        for entry in self.entries.values() {
            let status = PairStatus {
                source: entry.source.clone(),
                target: entry.target.clone(),
                worker_id: entry.worker_id(),
            };
            if entry.is_active() {
                listing.active.push(status);
            } else {
                listing.inactive.push(status);
            }
        }
        listing
    }

    /// Restores `source` from the backup at `target`.
    ///
    /// A worker serving exactly this pair is stopped first and is not
    /// resumed afterwards. The source may be missing; it is recreated.
    pub fn restore(&mut self, source: &Path, target: &Path) -> Result<RestoreSummary, RegistryError> {
        let source = paths::canonicalize(source)?;
        let backup = match paths::canonicalize(target) {
            Ok(backup) => backup,
            Err(PathError::NotFound { path }) => return Err(RegistryError::BackupMissing { path }),
            Err(error) => return Err(error.into()),
        };
        match fs::metadata(&backup) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return Err(RegistryError::BackupNotDirectory { path: backup }),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(RegistryError::BackupMissing { path: backup });
            }
            Err(error) => {
                return Err(PathError::Io {
                    action: "inspect",
                    path: backup,
                    source: error,
                }
                .into());
            }
        }
        if paths::is_subpath(&source, &backup) || paths::is_subpath(&backup, &source) {
            return Err(RegistryError::Overlap {
                source_root: source,
                backup,
            });
        }

        if let Some(entry) = self.entries.get_mut(&(source.clone(), backup.clone())) {
            if entry.stop().is_some() {
                info!(
                    target: "backup::registry",
                    source = %source.display(),
                    target_dir = %backup.display(),
                    "worker stopped for restore"
                );
            }
        }

        Ok(engine::restore(&source, &backup)?)
    }

    /// Collects workers that exited on their own without blocking.
    ///
    /// A clean exit leaves the pair inactive; a failed exit removes it.
    pub fn reap(&mut self) -> Vec<ReapEvent> {
        let mut events = Vec::new();
        let mut failed = Vec::new();
        for (key, entry) in &mut self.entries {
            let Some(worker) = entry.worker.as_mut() else {
                continue;
            };
            let exit = match worker.try_wait() {
                Ok(Some(exit)) => exit,
                Ok(None) => continue,
                Err(error) => {
                    warn!(target: "backup::registry", %error, pid = worker.id(), "failed to poll worker");
                    continue;
                }
            };
            entry.worker = None;
            if exit.is_success() {
                info!(
                    target: "backup::registry",
                    source = %entry.source.display(),
                    target_dir = %entry.target.display(),
                    "worker finished"
                );
                events.push(ReapEvent::Finished {
                    source: entry.source.clone(),
                    target: entry.target.clone(),
                });
            } else {
                warn!(
                    target: "backup::registry",
                    source = %entry.source.display(),
                    target_dir = %entry.target.display(),
                    %exit,
                    "worker failed"
                );
                failed.push(key.clone());
                events.push(ReapEvent::Failed {
                    source: entry.source.clone(),
                    target: entry.target.clone(),
                    exit,
                });
            }
        }
        for key in failed {
            self.entries.remove(&key);
        }
        events
    }

    /// Stops every active worker and waits for all of them.
    pub fn shutdown(&mut self) -> usize {
        let mut count = 0;
        for worker in self.entries.values_mut().filter_map(|entry| entry.worker.as_mut()) {
            if let Err(error) = worker.terminate() {
                warn!(target: "backup::registry", %error, pid = worker.id(), "failed to signal worker");
            }
            count += 1;
        }
        for entry in self.entries.values_mut() {
            entry.stop();
        }
        if count > 0 {
            info!(target: "backup::registry", count, "all workers stopped");
        }
        count
    }
}

impl<L: WorkerLauncher> Drop for Registry<L> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn check_target_usable(target: &Path) -> Result<(), RegistryError> {
    match fs::metadata(target) {
        Ok(metadata) if !metadata.is_dir() => Err(PathError::NotADirectory {
            path: target.to_path_buf(),
        }
        .into()),
        Ok(_) => {
            let empty = paths::is_dir_empty(target).map_err(|source| PathError::Io {
                action: "read directory",
                path: target.to_path_buf(),
                source,
            })?;
            if empty {
                Ok(())
            } else {
                Err(PathError::NotEmpty {
                    path: target.to_path_buf(),
                }
                .into())
            }
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(PathError::Io {
            action: "inspect",
            path: target.to_path_buf(),
            source: error,
        }
        .into()),
    }
}
