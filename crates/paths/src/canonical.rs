use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::PathError;

/// Missing trailing component recorded while searching for an existing ancestor.
enum Pending {
    Name(OsString),
    Parent,
}

/// Resolves `path` to an absolute canonical path.
///
/// Relative paths are resolved against the current working directory at call
/// time. When the path does not exist, the deepest existing ancestor is
/// canonicalised and the missing components are re-applied lexically.
pub fn canonicalize(path: &Path) -> Result<PathBuf, PathError> {
    let absolute = absolutize(path)?;
    let mut cursor = absolute.clone();
    let mut pending = Vec::new();

    loop {
        match fs::canonicalize(&cursor) {
            Ok(mut resolved) => {
                for component in pending.into_iter().rev() {
                    match component {
                        Pending::Name(name) => resolved.push(name),
                        Pending::Parent => {
                            resolved.pop();
                        }
                    }
                }
                return Ok(resolved);
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => return Err(PathError::io("resolve", cursor, error)),
        }

        match cursor.components().next_back() {
            Some(Component::Normal(name)) => pending.push(Pending::Name(name.to_os_string())),
            Some(Component::ParentDir) => pending.push(Pending::Parent),
            Some(Component::CurDir) => {}
            Some(Component::RootDir | Component::Prefix(_)) | None => {
                return Err(PathError::NotFound { path: absolute });
            }
        }
        if !cursor.pop() {
            return Err(PathError::NotFound { path: absolute });
        }
    }
}

fn absolutize(path: &Path) -> Result<PathBuf, PathError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir()
        .map_err(|error| PathError::io("read current directory", PathBuf::from("."), error))?;
    Ok(cwd.join(path))
}
