#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! The supervisor keeps the table of backup pairs for an interactive session
//! and owns the worker serving each active pair. It is driven by the shell
//! one command at a time.
//!
//! # Design
//!
//! [`Registry`] is generic over a [`WorkerLauncher`] so the table logic can
//! be exercised without spawning processes. [`ProcessLauncher`] is the real
//! launcher: it re-executes the running binary in worker mode and hands back
//! a [`WorkerHandle`] that signals and reaps the child.
//!
//! # Invariants
//!
//! - A target is written by at most one active worker.
//! - No target lies inside its own source.
//! - Every operand of `add` is checked before any directory is created or
//!   any worker is started.
//! - Ended pairs stay listed as inactive until the session ends; pairs whose
//!   worker failed are forgotten.

mod error;
mod launcher;
mod registry;


pub use error::RegistryError;
pub use launcher::{ProcessLauncher, WorkerExit, WorkerHandle, WorkerLauncher};
pub use registry::{
    BackupEntry, EndOutcome, Listing, PairStatus, ReapEvent, Registry, Started,
};
