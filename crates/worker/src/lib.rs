#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! A worker mirrors one source directory into one target directory. It first
//! synchronises the whole tree and then replays every change reported by the
//! [`watch`] crate until it is asked to stop or the source disappears.
//!
//! # Design
//!
//! [`run_worker`] holds the whole lifecycle and knows nothing about
//! processes: cancellation arrives through a [`ShutdownFlag`]. The backup
//! manager runs each worker in its own process through [`process::main`],
//! which wires SIGTERM to the flag and turns the [`WorkerReport`] into an
//! [`ExitCode`]. Tests run the same loop on a thread and raise the flag
//! directly.
//!
//! # Examples
//!
//! ```no_run
//! use worker::{ShutdownFlag, WorkerConfig, run_worker};
//! use std::time::Duration;
//!
//! let config = WorkerConfig::builder("/data/proj", "/backup/proj1")
//!     .poll_interval(Duration::from_millis(100))
//!     .build();
//! let shutdown = ShutdownFlag::new();
//! let stopper = shutdown.clone();
//! let handle = std::thread::spawn(move || run_worker(&config, &shutdown));
//! stopper.request();
//! let report = handle.join().expect("worker thread");
//! assert!(report.exit_code().is_success());
//! ```

mod config;
mod error;
mod exit_code;
pub mod process;
mod run;
mod shutdown;
mod state;

#[cfg(test)]
mod tests;

pub use config::{DEFAULT_POLL_INTERVAL, WorkerConfig, WorkerConfigBuilder};
pub use error::WorkerError;
pub use exit_code::ExitCode;
pub use run::{StopReason, WorkerReport, run_worker};
pub use shutdown::ShutdownFlag;
pub use state::WorkerState;
