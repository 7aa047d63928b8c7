//! crates/cli/src/args.rs
//!
//! Process arguments: the interactive shell and the hidden worker mode.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Arg, ArgAction, ArgMatches, Command as ClapCommand, value_parser};
use logging::Verbosity;
use worker::WorkerConfig;

use crate::config::{LOG_FILE_ENV, POLL_INTERVAL_ENV, ShellConfig};

pub(crate) const PROGRAM_NAME: &str = "backup";

/// What the process was asked to do.
#[derive(Debug)]
pub(crate) enum Invocation {
    Shell(ShellConfig),
    Worker {
        config: WorkerConfig,
        verbosity: Verbosity,
    },
}

pub(crate) fn clap_command() -> ClapCommand {
    ClapCommand::new(PROGRAM_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .about("Interactive live backup manager")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase diagnostic output on stderr (repeatable).")
                .action(ArgAction::Count)
                .global(true),
        )
        .arg(
            Arg::new("poll-interval")
                .long("poll-interval")
                .value_name("MS")
                .help("Milliseconds a worker waits for changes before checking for termination.")
                .env(POLL_INTERVAL_ENV)
                .value_parser(value_parser!(u64).range(1..))
                .default_value("250")
                .global(true),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("PATH")
                .help("Append every status line to PATH.")
                .env(LOG_FILE_ENV)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Print only warnings, errors and listings.")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            ClapCommand::new("worker")
                .hide(true)
                .about("Mirror one source into one target until terminated.")
                .arg(
                    Arg::new("source")
                        .long("source")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("target")
                        .long("target")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}

pub(crate) fn parse_args<I, S>(arguments: I, program: PathBuf) -> Result<Invocation, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
{
    let mut matches = clap_command().try_get_matches_from(arguments)?;

    if matches.subcommand_name() == Some("worker")
        && let Some((_, mut sub)) = matches.remove_subcommand()
    {
        let source = sub.remove_one::<PathBuf>("source").unwrap_or_default();
        let target = sub.remove_one::<PathBuf>("target").unwrap_or_default();
        let config = WorkerConfig::builder(source, target)
            .poll_interval(poll_interval(&sub))
            .build();
        return Ok(Invocation::Worker {
            config,
            verbosity: verbosity(&sub),
        });
    }

    let config = ShellConfig::new(program)
        .with_poll_interval(poll_interval(&matches))
        .with_log_file(matches.remove_one::<PathBuf>("log-file"))
        .with_quiet(matches.get_flag("quiet"))
        .with_verbosity(verbosity(&matches));
    Ok(Invocation::Shell(config))
}

fn poll_interval(matches: &ArgMatches) -> Duration {
    matches
        .get_one::<u64>("poll-interval")
        .map_or(worker::DEFAULT_POLL_INTERVAL, |millis| Duration::from_millis(*millis))
}

fn verbosity(matches: &ArgMatches) -> Verbosity {
    Verbosity::from_count(matches.get_count("verbose"))
}
