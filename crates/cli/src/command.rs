//! crates/cli/src/command.rs
//!
//! Parsing of one line typed at the shell prompt.

use std::ffi::OsString;
use std::os::unix::ffi::OsStringExt;
use std::path::PathBuf;

use thiserror::Error;

/// Help text printed by the `help` command.
pub const USAGE: &str = "\
Available commands:
  add <source> <target> [target...]   Start backing up source into each target
  end <source> <target> [target...]   Stop the named backups
  list                                Show active and inactive backups
  restore <source> <target>           Rebuild source from the backup in target
  exit                                Stop every backup and quit
  help                                Show this message
Paths may be quoted with '...' or \"...\"; backslash escapes a single character.";

/// A parsed shell command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    /// Start one worker per target.
    Add {
        /// Directory to back up.
        source: PathBuf,
        /// Backup destinations.
        targets: Vec<PathBuf>,
    },
    /// Stop the named workers.
    End {
        /// Directory being backed up.
        source: PathBuf,
        /// Backup destinations to stop.
        targets: Vec<PathBuf>,
    },
    /// Print the registry.
    List,
    /// Rebuild a source from one of its backups.
    Restore {
        /// Directory to rebuild.
        source: PathBuf,
        /// Backup to read from.
        target: PathBuf,
    },
    /// Stop everything and leave the shell.
    Exit,
    /// Print [`USAGE`].
    Help,
}

/// Error returned for a line that is not a valid command.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CommandError {
    /// A quote was opened and never closed.
    #[error("invalid arguments: unterminated quote")]
    UnterminatedQuote,
    /// The first word is not a known command.
    #[error("unknown command: {verb}. Type 'help' to see available commands.")]
    Unknown {
        /// The offending word.
        verb: String,
    },
    /// The command got the wrong number of arguments.
    #[error("invalid arguments. Usage: {usage}")]
    Usage {
        /// Synopsis of the command.
        usage: &'static str,
    },
}

impl Command {
    /// Parses `line`. Blank lines yield `Ok(None)`.
    ///
    /// The line is taken as raw bytes so paths that are not valid UTF-8 can
    /// still be named.
    ///
    /// ```
    /// use cli::Command;
    /// use std::path::PathBuf;
    ///
    /// let command = Command::parse(r#"add "/data/my proj" /backup/a"#).unwrap();
    /// assert_eq!(
    ///     command,
    ///     Some(Command::Add {
    ///         source: PathBuf::from("/data/my proj"),
    ///         targets: vec![PathBuf::from("/backup/a")],
    ///     })
    /// );
    /// ```
    pub fn parse(line: impl AsRef<[u8]>) -> Result<Option<Self>, CommandError> {
        let words = shlex::bytes::split(line.as_ref()).ok_or(CommandError::UnterminatedQuote)?;
        let mut words = words.into_iter();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let operands: Vec<PathBuf> = words
            .map(|word| PathBuf::from(OsString::from_vec(word)))
            .collect();

        let command = match verb.as_slice() {
            b"add" => {
                let (source, targets) = source_and_targets(operands, "add <source> <target> [target...]")?;
                Self::Add { source, targets }
            }
            b"end" => {
                let (source, targets) = source_and_targets(operands, "end <source> <target> [target...]")?;
                Self::End { source, targets }
            }
            b"restore" => match <[PathBuf; 2]>::try_from(operands) {
                Ok([source, target]) => Self::Restore { source, target },
                Err(_) => {
                    return Err(CommandError::Usage {
                        usage: "restore <source> <target>",
                    });
                }
            },
            b"list" => no_operands(&operands, Self::List, "list")?,
            b"exit" => no_operands(&operands, Self::Exit, "exit")?,
            b"help" => no_operands(&operands, Self::Help, "help")?,
            other => {
                return Err(CommandError::Unknown {
                    verb: String::from_utf8_lossy(other).into_owned(),
                });
            }
        };
        Ok(Some(command))
    }
}

fn source_and_targets(
    operands: Vec<PathBuf>,
    usage: &'static str,
) -> Result<(PathBuf, Vec<PathBuf>), CommandError> {
    let mut operands = operands.into_iter();
    match operands.next() {
        Some(source) if !operands.as_slice().is_empty() => Ok((source, operands.collect())),
        _ => Err(CommandError::Usage { usage }),
    }
}

fn no_operands(
    operands: &[PathBuf],
    command: Command,
    usage: &'static str,
) -> Result<Command, CommandError> {
    if operands.is_empty() {
        Ok(command)
    } else {
        Err(CommandError::Usage { usage })
    }
}
