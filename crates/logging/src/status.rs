//! crates/logging/src/status.rs
//! User-facing status lines printed by the interactive shell.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::line_mode::LineMode;

/// Severity tag rendered in front of a status line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Severity {
    /// A command succeeded.
    Ok,
    /// Progress information.
    Info,
    /// Something went wrong outside the current command.
    Warn,
    /// The current command failed.
    Error,
}

impl Severity {
    /// Returns the bracketed tag, e.g. `[OK]`.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Ok => "[OK]",
            Self::Info => "[INFO]",
            Self::Warn => "[WARN]",
            Self::Error => "[ERROR]",
        }
    }

    /// Reports whether quiet mode hides lines of this severity.
    #[must_use]
    pub const fn is_chatter(self) -> bool {
        matches!(self, Self::Ok | Self::Info)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Writes status lines to the terminal and, optionally, to a log file.
///
/// The log file receives every line, including those hidden by quiet mode,
/// but never the input prompt.
pub struct StatusSink<W> {
    writer: W,
    log_file: Option<File>,
    quiet: bool,
}

impl<W: Write> StatusSink<W> {
    /// Creates a sink writing to `writer` only.
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            log_file: None,
            quiet: false,
        }
    }

    /// Additionally appends every line to the file at `path`, creating it if
    /// needed.
    pub fn with_log_file(mut self, path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        self.log_file = Some(file);
        Ok(self)
    }

    /// Hides `[OK]` and `[INFO]` lines and their details from `writer`.
    #[must_use]
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Writes `[TAG] message`.
    pub fn status(&mut self, severity: Severity, message: impl fmt::Display) -> io::Result<()> {
        let line = format!("{} {message}", severity.tag());
        self.emit(!(self.quiet && severity.is_chatter()), &line)
    }

    /// Writes an untagged line belonging to the preceding status of `severity`.
    pub fn detail(&mut self, severity: Severity, text: impl fmt::Display) -> io::Result<()> {
        let line = text.to_string();
        self.emit(!(self.quiet && severity.is_chatter()), &line)
    }

    /// Writes an untagged line that quiet mode never hides.
    pub fn plain(&mut self, text: impl fmt::Display) -> io::Result<()> {
        let line = text.to_string();
        self.emit(true, &line)
    }

    /// Shorthand for [`Severity::Ok`].
    pub fn ok(&mut self, message: impl fmt::Display) -> io::Result<()> {
        self.status(Severity::Ok, message)
    }

    /// Shorthand for [`Severity::Info`].
    pub fn info(&mut self, message: impl fmt::Display) -> io::Result<()> {
        self.status(Severity::Info, message)
    }

    /// Shorthand for [`Severity::Warn`].
    pub fn warn(&mut self, message: impl fmt::Display) -> io::Result<()> {
        self.status(Severity::Warn, message)
    }

    /// Shorthand for [`Severity::Error`].
    pub fn error(&mut self, message: impl fmt::Display) -> io::Result<()> {
        self.status(Severity::Error, message)
    }

    /// Prints the input prompt without a newline. Quiet mode suppresses it.
    pub fn prompt(&mut self, prompt: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        write_line(&mut self.writer, prompt, LineMode::WithoutNewline)?;
        self.writer.flush()
    }

    /// Returns the terminal writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, to_writer: bool, line: &str) -> io::Result<()> {
        if to_writer {
            write_line(&mut self.writer, line, LineMode::WithNewline)?;
            self.writer.flush()?;
        }
        if let Some(file) = self.log_file.as_mut() {
            if let Err(error) = write_line(file, line, LineMode::WithNewline) {
                tracing::warn!(target: "backup::logging", %error, "cannot append to log file");
                self.log_file = None;
            }
        }
        Ok(())
    }
}

impl<W> fmt::Debug for StatusSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusSink")
            .field("log_file", &self.log_file.is_some())
            .field("quiet", &self.quiet)
            .finish_non_exhaustive()
    }
}

fn write_line(writer: &mut impl Write, line: &str, mode: LineMode) -> io::Result<()> {
    writer.write_all(line.as_bytes())?;
    if mode.append_newline() {
        writer.write_all(b"\n")?;
    }
    Ok(())
}
