//! Process entry point used by the hidden `worker` subcommand.
//!
//! The supervisor starts one process per source -> target pair and talks to
//! it only through signals and the exit status.

use paths::PathError;
use tracing::error;

use crate::{ExitCode, ShutdownFlag, WorkerConfig, run_worker};

/// Entry point of a worker process.
///
/// Refuses a target inside its own source with [`ExitCode::Usage`], installs
/// the SIGTERM/SIGINT handlers that raise the shutdown flag, runs the worker
/// and returns the status the process should exit with.
pub fn main(config: &WorkerConfig) -> ExitCode {
    if let Some(error) = nesting_error(config) {
        error!(target: "backup::worker", %error, "refusing to start");
        return ExitCode::Usage;
    }
    let shutdown = ShutdownFlag::new();
    if let Err(error) = shutdown.register_signals() {
        error!(target: "backup::worker", %error, "cannot install signal handlers");
        return ExitCode::WatchFailed;
    }
    run_worker(config, &shutdown).exit_code()
}

/// Reports a target that lives inside the source. Paths that cannot be
/// resolved are left for the worker itself to fail on.
fn nesting_error(config: &WorkerConfig) -> Option<PathError> {
    let source = paths::canonicalize(config.source()).ok()?;
    let target = paths::canonicalize(config.target()).ok()?;
    paths::ensure_not_nested(&source, &target).err()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::TempTree;

    #[test]
    fn target_inside_source_is_a_usage_error() {
        let tree = TempTree::new();
        tree.file("src/a.txt", b"a");
        let config = WorkerConfig::builder(tree.path("src"), tree.path("src/sub")).build();

        assert_eq!(main(&config), ExitCode::Usage);
        assert!(!tree.path("src/sub").exists());
    }

    #[test]
    fn unresolvable_target_is_left_to_the_worker() {
        let tree = TempTree::new();
        tree.file("src/a.txt", b"a").file("blocker", b"file");
        let config = WorkerConfig::builder(tree.path("src"), tree.path("blocker/dst")).build();

        assert!(nesting_error(&config).is_none());
    }
}
