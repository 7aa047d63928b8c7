#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` is the front-end of the `backup` binary. Run without a subcommand it
//! starts the interactive shell, where `add`, `end`, `list`, `restore`,
//! `help` and `exit` manage live backups. The hidden `worker` subcommand is
//! what the shell re-executes for every source -> target pair.
//!
//! # Design
//!
//! [`run`] takes the arguments together with the standard streams and
//! returns the process exit status, so the binary's `main` stays a one-liner
//! and tests can drive the whole front-end in memory. Arguments are parsed
//! with a `clap` builder. Each line typed at the prompt becomes a
//! [`Command`], tokenised with shell quoting rules, and is executed by a
//! [`Shell`] that owns the [`supervisor::Registry`].
//!
//! Input is read on its own thread and handed over a channel so the command
//! loop can notice SIGINT/SIGTERM while no line is pending.
//!
//! # Invariants
//!
//! - `run` never panics; failures become `[ERROR]` lines or a non-zero exit.
//! - When the shell returns, no worker it started is still running.
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let status = cli::run(["backup", "--version"], std::io::empty(), &mut stdout, &mut stderr);
//!
//! assert_eq!(status, 0);
//! assert!(String::from_utf8(stdout).unwrap().starts_with("backup "));
//! ```

use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::PathBuf;

use clap::error::ErrorKind;
use logging::{LOG_ENV, StatusSink};
use supervisor::ProcessLauncher;
use tracing::error;
use worker::{ExitCode, ShutdownFlag};

mod args;
mod command;
mod config;
mod input;
mod shell;


pub use command::{Command, CommandError, USAGE};
pub use config::{LOG_FILE_ENV, POLL_INTERVAL_ENV, ShellConfig};
pub use shell::{Flow, PROMPT, Shell};

use args::{Invocation, PROGRAM_NAME, parse_args};

/// Runs the program with `arguments` and returns its exit status.
pub fn run<I, S, R, O, E>(arguments: I, stdin: R, mut stdout: O, mut stderr: E) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
    R: Read + Send + 'static,
    O: Write,
    E: Write,
{
    let program = std::env::current_exe().unwrap_or_else(|_| PathBuf::from(PROGRAM_NAME));
    let invocation = match parse_args(arguments, program) {
        Ok(invocation) => invocation,
        Err(error) => {
            let rendered = error.render().to_string();
            return match error.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    let _ = stdout.write_all(rendered.as_bytes());
                    ExitCode::Ok.as_i32()
                }
                _ => {
                    let _ = stderr.write_all(rendered.as_bytes());
                    ExitCode::Usage.as_i32()
                }
            };
        }
    };

    match invocation {
        Invocation::Worker { config, verbosity } => {
            logging::init_tracing(verbosity);
            worker::process::main(&config).as_i32()
        }
        Invocation::Shell(config) => run_shell(&config, stdin, stdout, stderr),
    }
}

/// Runs the interactive shell until `exit`, end of input or a termination
/// signal.
pub fn run_shell<R, O, E>(config: &ShellConfig, stdin: R, stdout: O, mut stderr: E) -> i32
where
    R: Read + Send + 'static,
    O: Write,
    E: Write,
{
    let directives = logging::init_tracing(config.verbosity());

    let mut sink = StatusSink::new(stdout).quiet(config.quiet());
    if let Some(path) = config.log_file() {
        sink = match sink.with_log_file(path) {
            Ok(sink) => sink,
            Err(error) => {
                let _ = writeln!(
                    stderr,
                    "[ERROR] Cannot open file: {}: {error}",
                    path.display()
                );
                return ExitCode::Usage.as_i32();
            }
        };
    }

    let shutdown = ShutdownFlag::new();
    if let Err(error) = shutdown.register_signals() {
        error!(target: "backup::shell", %error, "cannot install signal handlers");
    }

    let launcher = ProcessLauncher::new(config.program())
        .poll_interval(config.poll_interval())
        .env(LOG_ENV, directives);
    let mut shell = Shell::new(launcher, sink);
    let lines = input::spawn_reader(stdin);

    let outcome = shell.banner().and_then(|()| shell.run(&lines, shutdown.as_atomic()));
    match outcome {
        Ok(()) => ExitCode::Ok.as_i32(),
        Err(error) => {
            let _ = writeln!(stderr, "[ERROR] Cannot write output: {error}");
            drop(shell);
            ExitCode::Usage.as_i32()
        }
    }
}
