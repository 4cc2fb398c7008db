//! Cryptographic primitives used by the generator and the pools.
//!
//! Both are thin wrappers over audited RustCrypto implementations: the
//! double SHA-256 construction condenses pool contents and mixes reseed
//! material, and the block cipher seam keys the counter-mode generator.

mod cipher;
mod hash;

pub use cipher::{Aes256Cipher, Block, BlockCipher, Key, BLOCK_SIZE, KEY_SIZE};
pub use hash::{Sha256d, DIGEST_SIZE};
