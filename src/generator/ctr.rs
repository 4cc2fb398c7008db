//! Counter-mode generator with mandatory rekeying.
//!
//! # Keying model
//!
//! - `reseed` mixes the previous key with new seed material:
//!   `key = SHA-256d(key || seed)`, then bumps the counter.
//! - Output blocks are `E(key, counter)` for successive counter values,
//!   the counter being encoded as a 128-bit little-endian integer.
//! - After every chunk of at most [`MAX_BYTES_PER_KEY`] bytes, two more
//!   blocks are generated and become the new key. They never reach the
//!   caller, so a key captured after a request says nothing about the
//!   bytes that request returned.
//!
//! The counter is never reset. Together with the rekeying this means no
//! counter value is ever encrypted twice under the same key.

use crate::primitives::{Aes256Cipher, Block, BlockCipher, Key, Sha256d, BLOCK_SIZE, KEY_SIZE};
use rand_core::{CryptoRng, RngCore};
use thiserror::Error;
use zeroize::Zeroize;

/// Maximum number of cipher blocks generated under one key.
pub const MAX_BLOCKS_PER_KEY: usize = 1 << 16;

/// Maximum number of output bytes generated under one key.
pub const MAX_BYTES_PER_KEY: usize = MAX_BLOCKS_PER_KEY * BLOCK_SIZE;

/// Errors that can occur during generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeneratorError {
    #[error("generator has not been seeded")]
    NotSeeded,
}

/// The Fortuna generator.
///
/// A fresh generator is unseeded and refuses to produce output until
/// [`Generator::reseed`] has been called at least once. There is no way
/// back to the unseeded state except [`Generator::seed`], which exists
/// for reproducible test output.
///
/// Not synchronised: wrap it in a lock (or use the accumulator's shared
/// handle) when several threads need it.
pub struct Generator<C: BlockCipher = Aes256Cipher> {
    /// Current key; all zero while unseeded.
    key: Key,
    /// Cipher instance keyed with `key`.
    cipher: C,
    /// Block counter, never reset.
    counter: u128,
    /// Whether `reseed` has been called since construction or `seed`.
    seeded: bool,
}

impl<C: BlockCipher> Generator<C> {
    /// Creates a new, unseeded generator.
    pub fn new() -> Self {
        let key = [0u8; KEY_SIZE];
        Self {
            cipher: C::with_key(&key),
            key,
            counter: 0,
            seeded: false,
        }
    }

    /// Returns true once the generator has been reseeded.
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Mixes `seed` into the generator key.
    ///
    /// Knowledge of the new key does not allow an attacker to recover
    /// the previous one, so earlier output stays protected.
    pub fn reseed(&mut self, seed: &[u8]) {
        let key = Sha256d::digest_parts(&[self.key.as_slice(), seed]);
        self.set_key(key);
        self.counter = self.counter.wrapping_add(1);
        self.seeded = true;

        tracing::trace!(seed_len = seed.len(), "Generator reseeded");
    }

    /// Reseeds with the big-endian encoding of `value`.
    pub fn reseed_i64(&mut self, value: i64) {
        self.reseed(&value.to_be_bytes());
    }

    /// Discards all state and reseeds with `value`.
    ///
    /// The output after this call depends on `value` alone. Never use
    /// this where the output has to be unpredictable.
    pub fn seed(&mut self, value: i64) {
        self.reset();
        self.reseed_i64(value);
    }

    /// Returns `n` pseudorandom bytes.
    pub fn generate(&mut self, n: usize) -> Result<Vec<u8>, GeneratorError> {
        let mut out = vec![0u8; n];
        self.fill(&mut out)?;
        Ok(out)
    }

    /// Fills `dest` with pseudorandom bytes.
    ///
    /// Either the whole buffer is filled or, if the generator is not
    /// seeded, nothing is written.
    pub fn fill(&mut self, dest: &mut [u8]) -> Result<(), GeneratorError> {
        if !self.seeded {
            return Err(GeneratorError::NotSeeded);
        }

        for chunk in dest.chunks_mut(MAX_BYTES_PER_KEY) {
            self.fill_blocks(chunk);
            self.rekey();
        }

        tracing::trace!(bytes = dest.len(), "Generated pseudorandom bytes");
        Ok(())
    }

    fn reset(&mut self) {
        self.set_key([0u8; KEY_SIZE]);
        self.counter = 0;
        self.seeded = false;
    }

    /// Writes keystream into `dest`, one counter value per started block.
    fn fill_blocks(&mut self, dest: &mut [u8]) {
        for out in dest.chunks_mut(BLOCK_SIZE) {
            let mut block = self.next_block();
            out.copy_from_slice(&block[..out.len()]);
            block.zeroize();
        }
    }

    fn next_block(&mut self) -> Block {
        let mut block = self.counter.to_le_bytes();
        self.cipher.encrypt_block(&mut block);
        self.counter = self.counter.wrapping_add(1);
        block
    }

    fn rekey(&mut self) {
        let mut key = [0u8; KEY_SIZE];
        self.fill_blocks(&mut key);
        self.set_key(key);
        key.zeroize();

        tracing::trace!(counter = %self.counter, "Generator rekeyed");
    }

    fn set_key(&mut self, key: Key) {
        self.key.zeroize();
        self.key = key;
        self.cipher = C::with_key(&self.key);
    }
}

impl<C: BlockCipher> Default for Generator<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: BlockCipher> Drop for Generator<C> {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl<C: BlockCipher> std::fmt::Debug for Generator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("seeded", &self.seeded)
            .finish_non_exhaustive()
    }
}

impl<C: BlockCipher> RngCore for Generator<C> {
    fn next_u32(&mut self) -> u32 {
        rand_core::impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        rand_core::impls::next_u64_via_fill(self)
    }

    /// # Panics
    ///
    /// Panics if the generator has not been seeded.
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        if let Err(err) = self.fill(dest) {
            panic!("{err}");
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill(dest).map_err(rand_core::Error::new)
    }
}

impl<C: BlockCipher> CryptoRng for Generator<C> {}
