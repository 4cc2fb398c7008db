//! Keyed pseudorandom stream generator.
//!
//! This module provides the Fortuna generator: a block cipher run in
//! counter mode that replaces its own key after every request.

mod ctr;

pub use ctr::{Generator, GeneratorError, MAX_BLOCKS_PER_KEY, MAX_BYTES_PER_KEY};
