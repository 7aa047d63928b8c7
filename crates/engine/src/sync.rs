use std::path::Path;
use std::sync::atomic::AtomicBool;

use tracing::info;

use crate::copy::{CopyPass, CopyRoots};
use crate::error::CopyError;
use crate::remove::prune_until;

/// Outcome of a full tree synchronisation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SyncSummary {
    /// Entries deleted from the target because the source no longer has them.
    pub removed: u64,
}

/// Makes `target` an exact mirror of `source`.
///
/// Everything under `source` is copied, then entries under `target` that the
/// source lacks are pruned, and finally directory modes are applied. Running
/// it against an already mirrored target only rewrites file contents.
///
/// `stop` is checked between entries; once it is raised the sync ends with
/// [`CopyError::Cancelled`] and leaves the target partially updated.
pub fn sync_tree(
    source: &Path,
    target: &Path,
    stop: &AtomicBool,
) -> Result<SyncSummary, CopyError> {
    let roots = CopyRoots::new(source, target);
    let mut pass = CopyPass::new(&roots, Some(stop));
    pass.copy(source, target)?;
    let removed = prune_until(source, target, Some(stop))?;
    pass.finish()?;
    info!(
        target: "backup::copy",
        source = %source.display(),
        target_dir = %target.display(),
        removed,
        "tree synchronised"
    );
    Ok(SyncSummary { removed })
}
