//! Thread-safe accumulator handle.

use super::clock::{Clock, SystemClock};
use super::engine::{Accumulator, AccumulatorError, AccumulatorStats};
use crate::primitives::{Aes256Cipher, BlockCipher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cloneable handle to an accumulator shared between threads.
///
/// Every call holds one lock for its whole duration, so pool updates,
/// reseed scheduling and generation never interleave.
pub struct SharedAccumulator<K: Clock = SystemClock, C: BlockCipher = Aes256Cipher> {
    inner: Arc<Mutex<Accumulator<K, C>>>,
}

impl<K: Clock, C: BlockCipher> SharedAccumulator<K, C> {
    /// Wraps an accumulator for shared use.
    pub fn new(accumulator: Accumulator<K, C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(accumulator)),
        }
    }

    /// See [`Accumulator::add_random_event`].
    pub fn add_random_event(
        &self,
        source_id: u8,
        pool_index: u8,
        data: &[u8],
    ) -> Result<(), AccumulatorError> {
        self.lock().add_random_event(source_id, pool_index, data)
    }

    /// See [`Accumulator::add_os_entropy`].
    pub fn add_os_entropy(&self) -> Result<(), AccumulatorError> {
        self.lock().add_os_entropy()
    }

    /// See [`Accumulator::random_data`].
    pub fn random_data(&self, n: usize) -> Result<Vec<u8>, AccumulatorError> {
        self.lock().random_data(n)
    }

    /// See [`Accumulator::fill`].
    pub fn fill(&self, dest: &mut [u8]) -> Result<(), AccumulatorError> {
        self.lock().fill(dest)
    }

    /// See [`Accumulator::stats`].
    pub fn stats(&self) -> AccumulatorStats {
        self.lock().stats()
    }

    /// Runs `f` with exclusive access to the accumulator.
    pub fn with<R>(&self, f: impl FnOnce(&mut Accumulator<K, C>) -> R) -> R {
        f(&mut self.lock())
    }

    // Accumulator methods leave the state consistent before anything can
    // panic, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Accumulator<K, C>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K: Clock, C: BlockCipher> Clone for SharedAccumulator<K, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: Clock, C: BlockCipher> From<Accumulator<K, C>> for SharedAccumulator<K, C> {
    fn from(accumulator: Accumulator<K, C>) -> Self {
        Self::new(accumulator)
    }
}
