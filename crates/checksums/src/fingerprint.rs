use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use tracing::trace;

use crate::Xxh3;

const READ_BUFFER: usize = 64 * 1024;

/// Length plus XXH3-64 digest of a file's contents.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Fingerprint {
    len: u64,
    digest: u64,
}

impl Fingerprint {
    /// Fingerprints an in-memory buffer.
    #[must_use]
    pub fn of_bytes(data: &[u8]) -> Self {
        Self {
            len: data.len() as u64,
            digest: Xxh3::digest(data),
        }
    }

    /// Number of bytes hashed.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    /// Reports whether the fingerprinted content was empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The XXH3-64 digest.
    #[must_use]
    pub const fn digest(&self) -> u64 {
        self.digest
    }
}

/// Streams the file at `path` through XXH3 and returns its fingerprint.
pub fn fingerprint_file(path: &Path) -> io::Result<Fingerprint> {
    let mut file = File::open(path)?;
    let mut hasher = Xxh3::new();
    let mut buffer = vec![0u8; READ_BUFFER];
    let mut len = 0u64;
    loop {
        let read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        };
        hasher.update(&buffer[..read]);
        len += read as u64;
    }
    let fingerprint = Fingerprint {
        len,
        digest: hasher.finalize(),
    };
    trace!(
        target: "backup::checksums",
        path = %path.display(),
        len,
        digest = format_args!("{:016x}", fingerprint.digest),
        "fingerprinted file"
    );
    Ok(fingerprint)
}
