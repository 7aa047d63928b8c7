#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `checksums` computes the content fingerprints the restore path uses to
//! decide whether a file in the source already matches its backed up copy.
//! Fingerprints pair the file length with a 64-bit XXH3 digest of the bytes.
//!
//! # Examples
//!
//! ```
//! use checksums::{Fingerprint, Xxh3};
//!
//! let mut hasher = Xxh3::new();
//! hasher.update(b"hello ");
//! hasher.update(b"world");
//! assert_eq!(hasher.finalize(), Xxh3::digest(b"hello world"));
//!
//! let a = Fingerprint::of_bytes(b"abcde");
//! let b = Fingerprint::of_bytes(b"abcdefgh");
//! assert_ne!(a, b);
//! ```

mod fingerprint;
mod xxhash;

pub use fingerprint::{Fingerprint, fingerprint_file};
pub use xxhash::Xxh3;
