//! crates/checksums/src/xxhash.rs
//!
//! Streaming XXH3-64 hasher backed by `xxhash-rust`.

/// Streaming XXH3 hasher that produces 64-bit digests.
#[derive(Clone)]
pub struct Xxh3 {
    inner: xxhash_rust::xxh3::Xxh3,
}

impl Xxh3 {
    /// Creates an unseeded hasher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: xxhash_rust::xxh3::Xxh3::new(),
        }
    }

    /// Feeds additional bytes into the digest state.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finalises the digest.
    #[must_use]
    pub fn finalize(self) -> u64 {
        self.inner.digest()
    }

    /// Computes the digest for `data` in one shot.
    #[must_use]
    pub fn digest(data: &[u8]) -> u64 {
        xxhash_rust::xxh3::xxh3_64(data)
    }
}

impl Default for Xxh3 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Xxh3;

    #[test]
    fn streaming_matches_one_shot() {
        let mut hasher = Xxh3::new();
        for chunk in b"the quick brown fox".chunks(3) {
            hasher.update(chunk);
        }
        assert_eq!(hasher.finalize(), Xxh3::digest(b"the quick brown fox"));
    }

    #[test]
    fn different_inputs_differ() {
        assert_ne!(Xxh3::digest(b"abcde"), Xxh3::digest(b"abcdf"));
    }
}
