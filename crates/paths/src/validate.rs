use std::fs::{self, DirBuilder};
use std::io;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{PathError, canonicalize};

/// Resolves a backup source, which must be an existing directory.
pub fn validate_source(path: &Path) -> Result<PathBuf, PathError> {
    let resolved = canonicalize(path)?;
    match fs::metadata(&resolved) {
        Ok(metadata) if metadata.is_dir() => Ok(resolved),
        Ok(_) => Err(PathError::NotADirectory { path: resolved }),
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            Err(PathError::NotFound { path: resolved })
        }
        Err(error) => Err(PathError::io("inspect", resolved, error)),
    }
}

/// Resolves a backup target.
///
/// A missing target is created together with any missing parents (mode
/// `0755`). An existing target must be an empty directory.
pub fn validate_target(path: &Path) -> Result<PathBuf, PathError> {
    let resolved = canonicalize(path)?;
    match fs::metadata(&resolved) {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(PathError::NotADirectory { path: resolved });
            }
            let empty = is_dir_empty(&resolved)
                .map_err(|error| PathError::io("read directory", resolved.clone(), error))?;
            if !empty {
                return Err(PathError::NotEmpty { path: resolved });
            }
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            debug!(target: "backup::paths", path = %resolved.display(), "creating target directory");
            DirBuilder::new()
                .recursive(true)
                .mode(0o755)
                .create(&resolved)
                .map_err(|source| PathError::CreateFailed {
                    path: resolved.clone(),
                    source,
                })?;
        }
        Err(error) => return Err(PathError::io("inspect", resolved, error)),
    }
    Ok(resolved)
}

/// Reports whether the directory at `path` has no entries.
pub fn is_dir_empty(path: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(path)?.next().transpose()?.is_none())
}
