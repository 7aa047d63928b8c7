#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! Two kinds of output leave the backup manager. Diagnostics are `tracing`
//! events written to stderr and filtered by verbosity. Status lines such as
//! `[OK] Backup started for source: /data` are the answer to a shell command
//! and go to stdout through a [`StatusSink`].
//!
//! # Design
//!
//! [`init_tracing`] installs a `tracing-subscriber` fmt subscriber whose
//! `EnvFilter` comes from `RUST_LOG`, the inherited [`LOG_ENV`] variable, or
//! the `-v` count, in that order. It returns the directives it used so the
//! shell can hand them to worker processes.
//!
//! [`StatusSink`] tags lines by [`Severity`], mirrors them into an optional
//! log file and honours quiet mode, which hides success chatter but never
//! warnings or errors.
//!
//! # Examples
//!
//! ```
//! use logging::{Severity, StatusSink};
//!
//! let mut sink = StatusSink::new(Vec::new());
//! sink.ok("Backup started for source: /data")?;
//! sink.detail(Severity::Ok, "     -> Target added: /backup")?;
//!
//! let output = String::from_utf8(sink.into_inner()).unwrap();
//! assert_eq!(
//!     output,
//!     "[OK] Backup started for source: /data\n     -> Target added: /backup\n"
//! );
//! # Ok::<(), std::io::Error>(())
//! ```

mod line_mode;
mod status;
mod subscriber;
mod verbosity;

pub use line_mode::LineMode;
pub use status::{Severity, StatusSink};
pub use subscriber::{LOG_ENV, RUST_LOG_ENV, build_filter, init_tracing, resolve_directives};
pub use verbosity::Verbosity;
