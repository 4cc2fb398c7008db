//! Block cipher abstraction for the counter-mode generator.
//!
//! The generator only needs a keyed pseudorandom permutation on 128-bit
//! blocks with a 256-bit key. AES-256 is the default; other ciphers with
//! the same geometry can be plugged in through [`BlockCipher`].

use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::Aes256;

/// Cipher block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Cipher key size in bytes.
pub const KEY_SIZE: usize = 32;

/// A single cipher block.
pub type Block = [u8; BLOCK_SIZE];

/// A generator key.
pub type Key = [u8; KEY_SIZE];

/// Trait for keyed block ciphers usable by the generator.
pub trait BlockCipher {
    /// Creates a cipher instance for the given key.
    fn with_key(key: &Key) -> Self;

    /// Encrypts one block in place.
    fn encrypt_block(&self, block: &mut Block);
}

/// AES-256 block cipher.
#[derive(Clone)]
pub struct Aes256Cipher {
    inner: Aes256,
}

impl BlockCipher for Aes256Cipher {
    fn with_key(key: &Key) -> Self {
        Self {
            inner: Aes256::new(GenericArray::from_slice(key)),
        }
    }

    #[inline]
    fn encrypt_block(&self, block: &mut Block) {
        self.inner
            .encrypt_block(GenericArray::from_mut_slice(block));
    }
}

impl std::fmt::Debug for Aes256Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aes256Cipher").finish_non_exhaustive()
    }
}
