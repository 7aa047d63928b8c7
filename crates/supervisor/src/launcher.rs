//! crates/supervisor/src/launcher.rs
//!
//! Starting, signalling and reaping worker processes.

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tracing::debug;
use worker::DEFAULT_POLL_INTERVAL;

/// How a worker ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WorkerExit {
    /// The worker exited with a status code.
    Code(i32),
    /// The worker was killed by a signal.
    Signal(i32),
}

impl WorkerExit {
    /// Reports whether the worker exited with status zero.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Code(0))
    }
}

impl From<ExitStatus> for WorkerExit {
    fn from(status: ExitStatus) -> Self {
        match (status.code(), status.signal()) {
            (Some(code), _) => Self::Code(code),
            (None, Some(signal)) => Self::Signal(signal),
            (None, None) => Self::Code(-1),
        }
    }
}

impl fmt::Display for WorkerExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => match worker::ExitCode::from_i32(*code) {
                Some(known) => write!(f, "{known}"),
                None => write!(f, "exit status {code}"),
            },
            Self::Signal(signal) => write!(f, "killed by signal {signal}"),
        }
    }
}

/// A running worker as seen by the registry.
pub trait WorkerHandle: fmt::Debug + Send {
    /// Process id (or any stable identifier) of the worker.
    fn id(&self) -> u32;

    /// Asks the worker to stop. Stopping an already finished worker succeeds.
    fn terminate(&mut self) -> io::Result<()>;

    /// Returns the exit status if the worker has finished, without blocking.
    fn try_wait(&mut self) -> io::Result<Option<WorkerExit>>;

    /// Blocks until the worker has finished.
    fn wait(&mut self) -> io::Result<WorkerExit>;
}

/// Starts workers for source -> target pairs.
pub trait WorkerLauncher {
    /// Starts a worker mirroring `source` into `target`.
    fn launch(&mut self, source: &Path, target: &Path) -> io::Result<Box<dyn WorkerHandle>>;
}

/// Launches each worker as a separate process running `program worker ...`.
///
/// Workers are placed in their own process group so a terminal interrupt
/// aimed at the shell does not reach them; they are stopped with SIGTERM.
#[derive(Clone, Debug)]
pub struct ProcessLauncher {
    program: PathBuf,
    poll_interval: Duration,
    env: Vec<(OsString, OsString)>,
}

impl ProcessLauncher {
    /// Creates a launcher that re-executes `program`.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            env: Vec::new(),
        }
    }

    /// Creates a launcher for the currently running executable.
    pub fn current_exe() -> io::Result<Self> {
        std::env::current_exe().map(Self::new)
    }

    /// Sets the poll interval passed to every worker.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Adds an environment variable to every worker.
    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    fn command(&self, source: &Path, target: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("worker")
            .arg("--source")
            .arg(source)
            .arg("--target")
            .arg(target)
            .arg("--poll-interval")
            .arg(self.poll_interval.as_millis().to_string())
            .envs(self.env.iter().map(|(key, value)| (key, value)))
            .stdin(Stdio::null())
            .process_group(0);
        command
    }
}

impl WorkerLauncher for ProcessLauncher {
    fn launch(&mut self, source: &Path, target: &Path) -> io::Result<Box<dyn WorkerHandle>> {
        let child = self.command(source, target).spawn()?;
        debug!(
            target: "backup::registry",
            pid = child.id(),
            source = %source.display(),
            target_dir = %target.display(),
            "worker process spawned"
        );
        Ok(Box::new(ChildWorker { child }))
    }
}

#[derive(Debug)]
struct ChildWorker {
    child: Child,
}

impl WorkerHandle for ChildWorker {
    fn id(&self) -> u32 {
        self.child.id()
    }

    fn terminate(&mut self) -> io::Result<()> {
        if self.child.try_wait()?.is_some() {
            return Ok(());
        }
        match kill(Pid::from_raw(self.child.id() as i32), Signal::SIGTERM) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(errno) => Err(io::Error::from(errno)),
        }
    }

    fn try_wait(&mut self) -> io::Result<Option<WorkerExit>> {
        Ok(self.child.try_wait()?.map(WorkerExit::from))
    }

    fn wait(&mut self) -> io::Result<WorkerExit> {
        self.child.wait().map(WorkerExit::from)
    }
}
