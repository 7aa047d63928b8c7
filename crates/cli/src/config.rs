use std::path::{Path, PathBuf};
use std::time::Duration;

use logging::Verbosity;
use worker::DEFAULT_POLL_INTERVAL;

/// Environment fallback for `--log-file`.
pub const LOG_FILE_ENV: &str = "BACKUP_LOG_FILE";

/// Environment fallback for `--poll-interval`.
pub const POLL_INTERVAL_ENV: &str = "BACKUP_POLL_INTERVAL_MS";

/// Settings of one interactive session.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ShellConfig {
    program: PathBuf,
    poll_interval: Duration,
    log_file: Option<PathBuf>,
    quiet: bool,
    verbosity: Verbosity,
}

impl ShellConfig {
    /// Creates a configuration that re-executes `program` for each worker.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            log_file: None,
            quiet: false,
            verbosity: Verbosity::default(),
        }
    }

    /// Sets how often workers check for termination while idle.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Mirrors every status line into `path`.
    #[must_use]
    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log_file = path;
        self
    }

    /// Hides success chatter and the prompt.
    #[must_use]
    pub const fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Sets the diagnostic verbosity.
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Executable started in worker mode.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Worker poll interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Status log file, if any.
    #[must_use]
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Whether quiet mode is on.
    #[must_use]
    pub const fn quiet(&self) -> bool {
        self.quiet
    }

    /// Diagnostic verbosity.
    #[must_use]
    pub const fn verbosity(&self) -> Verbosity {
        self.verbosity
    }
}
