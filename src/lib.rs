//! Fortuna CSPRNG Library
//!
//! An implementation of the Fortuna generator and accumulator, built to
//! produce deterministic reference vectors for other implementations.
//!
//! # Architecture
//!
//! ```text
//! events → accumulator (32 pools) → reseed → generator (AES-256-CTR)
//!                   ↑                              ↓
//!                 clock                      random bytes
//! ```
//!
//! - [`generator`]: AES-256 in counter mode, rekeyed after every request
//!   and at least every 2^20 bytes
//! - [`accumulator`]: entropy pools and the reseed schedule
//! - [`primitives`]: the block cipher and double SHA-256
//! - [`vectors`]: fixed scenarios producing the reference output
//! - [`metrics`]: Prometheus view of accumulator state
//!
//! # Example
//!
//! ```
//! use fortuna_vectors::{Accumulator, Generator};
//!
//! let mut gen: Generator = Generator::new();
//! gen.reseed(&[1, 2, 3, 4]);
//! let bytes = gen.generate(100).unwrap();
//! assert_eq!(&bytes[..4], &[82, 254, 233, 139]);
//!
//! let mut acc = Accumulator::new();
//! acc.add_random_event(0, 0, &[0u8; 32]).unwrap();
//! acc.add_random_event(0, 0, &[0u8; 32]).unwrap();
//! assert_eq!(acc.random_data(16).unwrap().len(), 16);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod accumulator;
pub mod config;
pub mod generator;
pub mod metrics;
pub mod primitives;
pub mod vectors;

// Re-export commonly used types at crate root
pub use accumulator::{
    Accumulator, AccumulatorConfig, AccumulatorError, AccumulatorStats, Clock, ManualClock,
    SharedAccumulator, SystemClock,
};
pub use config::FileConfig;
pub use generator::{Generator, GeneratorError};
pub use primitives::{Aes256Cipher, BlockCipher, Sha256d};
pub use vectors::{OutputFormat, ReferenceVector};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
