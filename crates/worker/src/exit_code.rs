//! Process exit statuses of a worker.
//!
//! The supervisor only distinguishes success from failure, but the distinct
//! failure codes make worker logs and test assertions precise.

use std::fmt;

/// Exit status a worker process reports to its supervisor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    /// The worker finished normally, either on request or because its source
    /// disappeared.
    Ok = 0,

    /// The worker was started with invalid arguments.
    Usage = 1,

    /// The initial copy of the source into the target failed.
    ///
    /// The watch loop was never started.
    InitialSync = 11,

    /// Watches could not be placed or the event channel failed.
    WatchFailed = 12,
}

impl ExitCode {
    /// Returns the numeric process status.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Maps a numeric status back to a known code.
    #[must_use]
    pub const fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::Usage),
            11 => Some(Self::InitialSync),
            12 => Some(Self::WatchFailed),
            _ => None,
        }
    }

    /// Returns a human-readable description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Ok => "success",
            Self::Usage => "usage error",
            Self::InitialSync => "initial synchronisation failed",
            Self::WatchFailed => "change watching failed",
        }
    }

    /// Reports whether the code signals success.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}
