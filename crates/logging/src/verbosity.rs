//! crates/logging/src/verbosity.rs
//! Mapping from `-v` occurrences to a tracing filter.

use std::fmt;

use tracing::level_filters::LevelFilter;

/// How much diagnostic output the program emits on stderr.
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub enum Verbosity {
    /// Warnings and errors only.
    #[default]
    Warn,
    /// Lifecycle events: workers started and stopped, restores.
    Info,
    /// Every mirrored change.
    Debug,
    /// Everything, including raw watch events.
    Trace,
}

impl Verbosity {
    /// Maps the number of `-v` flags onto a verbosity.
    ///
    /// ```
    /// use logging::Verbosity;
    ///
    /// assert_eq!(Verbosity::from_count(0), Verbosity::Warn);
    /// assert_eq!(Verbosity::from_count(2), Verbosity::Debug);
    /// assert_eq!(Verbosity::from_count(9), Verbosity::Trace);
    /// ```
    #[must_use]
    pub const fn from_count(count: u8) -> Self {
        match count {
            0 => Self::Warn,
            1 => Self::Info,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    /// Returns the equivalent tracing level filter.
    #[must_use]
    pub const fn level_filter(self) -> LevelFilter {
        match self {
            Self::Warn => LevelFilter::WARN,
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
        }
    }

    /// Returns the filter directive understood by `EnvFilter`.
    #[must_use]
    pub const fn directive(self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.directive())
    }
}
