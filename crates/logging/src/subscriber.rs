//! crates/logging/src/subscriber.rs
//! Installation of the global tracing subscriber.

use std::env;
use std::io;

use tracing_subscriber::EnvFilter;

use crate::verbosity::Verbosity;

/// Environment variable carrying the filter directives from the shell to the
/// worker processes it spawns.
pub const LOG_ENV: &str = "BACKUP_LOG";

/// Standard tracing environment variable; takes precedence over everything.
pub const RUST_LOG_ENV: &str = "RUST_LOG";

/// Picks the filter directives to use.
///
/// `RUST_LOG` wins, then [`LOG_ENV`], then the `-v` derived verbosity. Empty
/// values are ignored.
#[must_use]
pub fn resolve_directives(
    verbosity: Verbosity,
    lookup: impl Fn(&str) -> Option<String>,
) -> String {
    [RUST_LOG_ENV, LOG_ENV]
        .into_iter()
        .filter_map(lookup)
        .map(|value| value.trim().to_owned())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| verbosity.directive().to_owned())
}

/// Builds the filter for `directives`, falling back to `verbosity` when they
/// do not parse.
#[must_use]
pub fn build_filter(directives: &str, verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|error| {
        eprintln!("ignoring invalid log filter {directives:?}: {error}");
        EnvFilter::new(verbosity.directive())
    })
}

/// Installs a fmt subscriber writing to stderr.
///
/// Returns the directives in effect so they can be forwarded to child
/// processes through [`LOG_ENV`]. Installing twice is harmless; the first
/// subscriber stays in place.
pub fn init_tracing(verbosity: Verbosity) -> String {
    let directives = resolve_directives(verbosity, |key| env::var(key).ok());
    let filter = build_filter(&directives, verbosity);
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(target: "backup::logging", %directives, "tracing initialised");
    }
    directives
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn verbosity_is_used_without_environment() {
        assert_eq!(resolve_directives(Verbosity::Debug, env_of(&[])), "debug");
    }

    #[test]
    fn inherited_filter_beats_verbosity() {
        let lookup = env_of(&[(LOG_ENV, "backup::worker=trace")]);
        assert_eq!(
            resolve_directives(Verbosity::Warn, lookup),
            "backup::worker=trace"
        );
    }

    #[test]
    fn rust_log_beats_everything() {
        let lookup = env_of(&[(LOG_ENV, "info"), (RUST_LOG_ENV, "error")]);
        assert_eq!(resolve_directives(Verbosity::Trace, lookup), "error");
    }

    #[test]
    fn blank_values_are_ignored() {
        let lookup = env_of(&[(RUST_LOG_ENV, "  "), (LOG_ENV, "")]);
        assert_eq!(resolve_directives(Verbosity::Info, lookup), "info");
    }

    #[test]
    fn invalid_directives_fall_back() {
        let filter = build_filter("backup=loudest", Verbosity::Info);
        assert_eq!(filter.max_level_hint(), Some(Verbosity::Info.level_filter()));
    }
}
