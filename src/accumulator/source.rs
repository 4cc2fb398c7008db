//! Entropy source bookkeeping.
//!
//! Each source gets its own id and spreads its events over the pools in
//! round-robin order, so every pool receives a share of every source.

use super::pool::NUM_POOLS;
use std::time::Instant;

/// Longest event payload stored verbatim; longer payloads are hashed.
pub const MAX_EVENT_SIZE: usize = 32;

/// Handle for one registered entropy source.
///
/// Obtained from [`Accumulator::register_source`](super::Accumulator::register_source).
#[derive(Debug, Clone)]
pub struct SourceHandle {
    id: u8,
    seq: u64,
    last_timestamp: Instant,
}

impl SourceHandle {
    pub(crate) fn new(id: u8, registered_at: Instant) -> Self {
        Self {
            id,
            seq: 0,
            last_timestamp: registered_at,
        }
    }

    /// Returns the source id used to tag events.
    #[inline]
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Returns the number of events submitted through this handle.
    #[inline]
    pub fn events_submitted(&self) -> u64 {
        self.seq
    }

    /// Returns the pool for the next event and advances the rotation.
    pub(crate) fn next_pool(&mut self) -> u8 {
        let pool = (self.seq % NUM_POOLS as u64) as u8;
        self.seq += 1;
        pool
    }

    /// Encodes the time since the previous timestamp as event data.
    ///
    /// The interval is measured in nanoseconds and encoded as a
    /// big-endian `i64`; timestamps earlier than the previous one encode
    /// a zero interval.
    pub(crate) fn interval_event(&mut self, at: Instant) -> [u8; 8] {
        let dt = at.saturating_duration_since(self.last_timestamp);
        self.last_timestamp = at;
        let nanos = i64::try_from(dt.as_nanos()).unwrap_or(i64::MAX);
        nanos.to_be_bytes()
    }
}
