use std::path::{Path, PathBuf};
use std::time::Duration;

/// Poll interval used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Settings for one source -> target worker.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WorkerConfig {
    source: PathBuf,
    target: PathBuf,
    poll_interval: Duration,
}

impl WorkerConfig {
    /// Starts building a config for the given pair.
    #[must_use]
    pub fn builder(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> WorkerConfigBuilder {
        WorkerConfigBuilder {
            source: source.into(),
            target: target.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Source directory being mirrored.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Target directory receiving the mirror.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Upper bound on how long a shutdown request may go unnoticed.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

/// Builder for [`WorkerConfig`].
#[derive(Clone, Debug)]
pub struct WorkerConfigBuilder {
    source: PathBuf,
    target: PathBuf,
    poll_interval: Duration,
}

impl WorkerConfigBuilder {
    /// Overrides the poll interval. Zero is raised to one millisecond.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Finishes the config.
    #[must_use]
    pub fn build(self) -> WorkerConfig {
        WorkerConfig {
            source: self.source,
            target: self.target,
            poll_interval: self.poll_interval,
        }
    }
}
