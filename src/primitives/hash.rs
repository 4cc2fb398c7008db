//! Double SHA-256.
//!
//! `Sha256d(m) = SHA-256(SHA-256(m))`. Hashing the digest a second time
//! removes the length-extension property of plain SHA-256.

use sha2::{Digest, Sha256};

/// Size of a `Sha256d` digest in bytes.
pub const DIGEST_SIZE: usize = 32;

/// Incremental double SHA-256 hasher.
#[derive(Clone, Default)]
pub struct Sha256d {
    inner: Sha256,
}

impl Sha256d {
    /// Creates an empty hasher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds more data into the running digest.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Returns the digest of everything fed so far and resets the hasher
    /// to its empty state.
    pub fn finalize_reset(&mut self) -> [u8; DIGEST_SIZE] {
        let first = self.inner.finalize_reset();
        Sha256::digest(first).into()
    }

    /// One-shot digest of the concatenation of `parts`.
    pub fn digest_parts(parts: &[&[u8]]) -> [u8; DIGEST_SIZE] {
        let mut hasher = Self::new();
        for part in parts {
            hasher.update(part);
        }
        hasher.finalize_reset()
    }
}

impl std::fmt::Debug for Sha256d {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sha256d").finish_non_exhaustive()
    }
}
