//! crates/cli/src/shell.rs
//!
//! The interactive command loop.

use std::fmt::Display;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use logging::{Severity, StatusSink};
use supervisor::{EndOutcome, PairStatus, ReapEvent, Registry, WorkerLauncher};
use tracing::{debug, info};

use crate::command::{Command, USAGE};

/// Prompt printed before each command.
pub const PROMPT: &str = "backup> ";

/// How often the loop wakes up to look at the shutdown flag.
const TICK: Duration = Duration::from_millis(100);

/// Whether the loop keeps reading commands.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flow {
    /// Read the next command.
    Continue,
    /// Leave the loop.
    Exit,
}

/// The command interpreter: a registry plus the sink its answers go to.
pub struct Shell<L: WorkerLauncher, W: Write> {
    registry: Registry<L>,
    sink: StatusSink<W>,
}

impl<L: WorkerLauncher, W: Write> Shell<L, W> {
    /// Creates a shell around an empty registry.
    pub fn new(launcher: L, sink: StatusSink<W>) -> Self {
        Self {
            registry: Registry::new(launcher),
            sink,
        }
    }

    /// The registry driven by this shell.
    pub const fn registry(&self) -> &Registry<L> {
        &self.registry
    }

    /// Stops every worker and returns the terminal writer.
    pub fn into_output(mut self) -> W {
        self.registry.shutdown();
        let Self { sink, .. } = self;
        sink.into_inner()
    }

    /// Prints the greeting shown once at startup.
    pub fn banner(&mut self) -> io::Result<()> {
        self.sink
            .detail(Severity::Info, "Interactive Backup Management System")?;
        self.sink
            .detail(Severity::Info, "Type 'help' to see available commands.")
    }

    /// Reads commands from `lines` until `exit`, end of input or `shutdown`.
    ///
    /// Every active worker is stopped before this returns.
    pub fn run(&mut self, lines: &Receiver<Vec<u8>>, shutdown: &AtomicBool) -> io::Result<()> {
        loop {
            self.sink.prompt(PROMPT)?;
            let line = loop {
                if shutdown.load(Ordering::Relaxed) {
                    info!(target: "backup::shell", "termination requested");
                    break None;
                }
                match lines.recv_timeout(TICK) {
                    Ok(line) => break Some(line),
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break None,
                }
            };
            let Some(line) = line else {
                self.stop_all()?;
                return Ok(());
            };
            if self.handle_line(line)? == Flow::Exit {
                return Ok(());
            }
        }
    }

    /// Reports finished workers, then parses and executes one line.
    ///
    /// A line that does not parse is answered with an `[ERROR]` line and the
    /// shell keeps going.
    pub fn handle_line(&mut self, line: impl AsRef<[u8]>) -> io::Result<Flow> {
        self.report_reaped()?;
        match Command::parse(line) {
            Ok(Some(command)) => self.execute(command),
            Ok(None) => Ok(Flow::Continue),
            Err(error) => {
                self.sink.error(sentence(&error))?;
                Ok(Flow::Continue)
            }
        }
    }

    /// Executes one command.
    pub fn execute(&mut self, command: Command) -> io::Result<Flow> {
        debug!(target: "backup::shell", ?command, "executing");
        match command {
            Command::Add { source, targets } => self.add(&source, &targets)?,
            Command::End { source, targets } => self.end(&source, &targets)?,
            Command::List => self.list()?,
            Command::Restore { source, target } => self.restore(&source, &target)?,
            Command::Help => {
                for line in USAGE.lines() {
                    self.sink.plain(line)?;
                }
            }
            Command::Exit => {
                self.stop_all()?;
                return Ok(Flow::Exit);
            }
        }
        Ok(Flow::Continue)
    }

    fn add(&mut self, source: &Path, targets: &[PathBuf]) -> io::Result<()> {
        match self.registry.add(source, targets) {
            Ok(started) => {
                if let Some(first) = started.first() {
                    self.sink.ok(format_args!(
                        "Backup started for source: {}",
                        first.source.display()
                    ))?;
                }
                for pair in &started {
                    self.sink.detail(
                        Severity::Ok,
                        format_args!("     -> Target added: {}", pair.target.display()),
                    )?;
                }
                Ok(())
            }
            Err(error) => self.sink.error(sentence(&error)),
        }
    }

    fn end(&mut self, source: &Path, targets: &[PathBuf]) -> io::Result<()> {
        for outcome in self.registry.end(source, targets) {
            match outcome {
                EndOutcome::Stopped { source, target } => self.sink.ok(format_args!(
                    "Backup stopped: {} -> {}",
                    source.display(),
                    target.display()
                ))?,
                EndOutcome::NotFound { source, target } => self.sink.error(format_args!(
                    "No active backup: {} -> {}",
                    source.display(),
                    target.display()
                ))?,
            }
        }
        Ok(())
    }

    fn list(&mut self) -> io::Result<()> {
        let listing = self.registry.list();
        if !listing.has_active() {
            self.sink.plain("No active backups.")?;
        } else {
            self.sink.plain("Active backups:")?;
            self.list_pairs(&listing.active)?;
        }
        if !listing.inactive.is_empty() {
            self.sink.plain("Inactive backups:")?;
            self.list_pairs(&listing.inactive)?;
        }
        Ok(())
    }

    fn list_pairs(&mut self, pairs: &[PairStatus]) -> io::Result<()> {
        for pair in pairs {
            self.sink.plain(format_args!(
                "  {}  ->  {}",
                pair.source.display(),
                pair.target.display()
            ))?;
        }
        Ok(())
    }

    fn restore(&mut self, source: &Path, target: &Path) -> io::Result<()> {
        self.sink.info("Restoring backup:")?;
        self.sink.detail(
            Severity::Info,
            format_args!("       Source : {}", source.display()),
        )?;
        self.sink.detail(
            Severity::Info,
            format_args!("       Backup : {}", target.display()),
        )?;
        match self.registry.restore(source, target) {
            Ok(summary) => {
                info!(
                    target: "backup::restore",
                    copied = summary.copied,
                    skipped = summary.skipped,
                    removed = summary.removed,
                    "restore finished"
                );
                self.sink.ok("Restore completed successfully.")
            }
            Err(error) => self.sink.error(format_args!("Restore failed: {error}")),
        }
    }

    fn report_reaped(&mut self) -> io::Result<()> {
        for event in self.registry.reap() {
            match event {
                ReapEvent::Finished { source, target } => self.sink.info(format_args!(
                    "Backup ended: {} -> {}",
                    source.display(),
                    target.display()
                ))?,
                ReapEvent::Failed {
                    source,
                    target,
                    exit,
                } => self.sink.warn(format_args!(
                    "Backup worker failed ({exit}), backup removed: {} -> {}",
                    source.display(),
                    target.display()
                ))?,
            }
        }
        Ok(())
    }

    fn stop_all(&mut self) -> io::Result<()> {
        let stopped = self.registry.shutdown();
        if stopped > 0 {
            self.sink.ok(format_args!("Stopped {stopped} backup(s)."))?;
        }
        Ok(())
    }
}

/// Renders an error as a sentence: first letter upper-cased.
fn sentence(error: &impl Display) -> String {
    let message = error.to_string();
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => message,
    }
}
