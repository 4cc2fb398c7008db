//! Entropy pool.
//!
//! Condenses everything added to it into a running double SHA-256
//! digest. The raw input is never stored.

use crate::primitives::{Sha256d, DIGEST_SIZE};

/// Number of entropy pools owned by an accumulator.
pub const NUM_POOLS: usize = 32;

/// A single entropy pool.
#[derive(Debug, Clone)]
pub struct Pool {
    /// Pool index, fixed at creation.
    id: u8,
    /// Digest of everything added since the last reset.
    hasher: Sha256d,
    /// Bytes added since the last reset.
    byte_count: u64,
}

impl Pool {
    /// Creates an empty pool with the given index.
    pub fn new(id: u8) -> Self {
        Self {
            id,
            hasher: Sha256d::new(),
            byte_count: 0,
        }
    }

    /// Returns the pool index.
    #[inline]
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Returns the number of bytes added since the last reset.
    #[inline]
    pub fn byte_count(&self) -> u64 {
        self.byte_count
    }

    /// Returns true if nothing has been added since the last reset.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.byte_count == 0
    }

    /// Adds data to the pool.
    pub fn add(&mut self, data: &[u8]) {
        self.hasher.update(data);
        self.byte_count += data.len() as u64;

        tracing::trace!(
            pool = self.id,
            bytes_added = data.len(),
            pool_size = self.byte_count,
            "Added entropy to pool"
        );
    }

    /// Returns the digest of the pool contents and empties the pool.
    pub fn extract_and_reset(&mut self) -> [u8; DIGEST_SIZE] {
        let digest = self.hasher.finalize_reset();

        tracing::debug!(
            pool = self.id,
            pool_size = self.byte_count,
            "Extracted pool digest"
        );

        self.byte_count = 0;
        digest
    }
}
