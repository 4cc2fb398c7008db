//! The Fortuna accumulator.
//!
//! # Reseed Model
//!
//! Events are spread over 32 pools. A request reseeds the generator when
//! pool 0 holds at least `min_pool_size` bytes and the previous reseed is
//! at least `min_reseed_interval` old. Reseed number `r` uses pool `k`
//! iff `2^k` divides `r`: pool 0 every time, pool 1 every second time,
//! pool 2 every fourth time, and so on. Rarely used pools build up enough
//! entropy to recover from a state compromise even when an attacker
//! controls the more frequently drained ones.

use super::clock::{Clock, SystemClock};
use super::config::{AccumulatorConfig, ConfigError};
use super::pool::{Pool, NUM_POOLS};
use super::source::{SourceHandle, MAX_EVENT_SIZE};
use crate::generator::{Generator, GeneratorError};
use crate::primitives::{Aes256Cipher, BlockCipher, DIGEST_SIZE};
use rand_core::{CryptoRng, OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::time::Instant;
use thiserror::Error;
use zeroize::Zeroize;

/// Operating system samples submitted by [`Accumulator::add_os_entropy`].
/// Two rounds over all pools put 68 bytes into pool 0.
const OS_ENTROPY_SAMPLES: usize = 2 * NUM_POOLS;

/// Errors returned by the accumulator.
#[derive(Debug, Error)]
pub enum AccumulatorError {
    #[error("insufficient entropy: pool 0 has not received any events")]
    InsufficientEntropy,
    #[error("invalid pool index {0} (must be below 32)")]
    InvalidPoolIndex(u8),
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    #[error("entropy source failed: {0}")]
    EntropySource(String),
}

/// A snapshot of accumulator counters, used for metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccumulatorStats {
    /// Reseeds performed so far.
    pub reseed_count: u64,
    /// Bytes currently held by each pool.
    pub pool_sizes: [u64; NUM_POOLS],
    /// Events accepted since creation.
    pub events_added: u64,
    /// Bytes handed out since creation.
    pub bytes_generated: u64,
    /// Whether the generator has been seeded.
    pub seeded: bool,
}

/// Entropy accumulator driving a Fortuna generator.
///
/// Owns its pools and generator exclusively. Not synchronised; see
/// [`SharedAccumulator`](super::SharedAccumulator) for concurrent use.
pub struct Accumulator<K: Clock = SystemClock, C: BlockCipher = Aes256Cipher> {
    config: AccumulatorConfig,
    pools: [Pool; NUM_POOLS],
    generator: Generator<C>,
    clock: K,
    reseed_count: u64,
    /// `None` until the first reseed.
    last_reseed: Option<Instant>,
    next_source: u8,
    events_added: u64,
    bytes_generated: u64,
}

impl Accumulator {
    /// Creates an accumulator with the default configuration and the
    /// system clock.
    pub fn new() -> Self {
        Self::build(AccumulatorConfig::default(), SystemClock)
    }

    /// Creates an accumulator with a custom configuration.
    pub fn with_config(config: AccumulatorConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clock, C: BlockCipher> Accumulator<K, C> {
    /// Creates an accumulator reading time from `clock`.
    pub fn with_clock(config: AccumulatorConfig, clock: K) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, clock))
    }

    fn build(config: AccumulatorConfig, clock: K) -> Self {
        Self {
            config,
            pools: std::array::from_fn(|i| Pool::new(i as u8)),
            generator: Generator::new(),
            clock,
            reseed_count: 0,
            last_reseed: None,
            next_source: 0,
            events_added: 0,
            bytes_generated: 0,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &AccumulatorConfig {
        &self.config
    }

    /// Returns the number of reseeds performed.
    pub fn reseed_count(&self) -> u64 {
        self.reseed_count
    }

    /// Returns the pool with the given index.
    pub fn pool(&self, index: usize) -> Option<&Pool> {
        self.pools.get(index)
    }

    /// Adds an entropy event to pool `pool_index`.
    ///
    /// The pool receives `[source_id, len(data)] || data`. Payloads longer
    /// than 32 bytes are replaced by their SHA-256 digest first.
    pub fn add_random_event(
        &mut self,
        source_id: u8,
        pool_index: u8,
        data: &[u8],
    ) -> Result<(), AccumulatorError> {
        let pool = self
            .pools
            .get_mut(usize::from(pool_index))
            .ok_or(AccumulatorError::InvalidPoolIndex(pool_index))?;

        let condensed;
        let data = if data.len() > MAX_EVENT_SIZE {
            condensed = Sha256::digest(data);
            condensed.as_slice()
        } else {
            data
        };

        pool.add(&[source_id, data.len() as u8]);
        pool.add(data);
        self.events_added += 1;
        Ok(())
    }

    /// Registers a new entropy source.
    ///
    /// Source ids are handed out in order and wrap after 256 sources.
    pub fn register_source(&mut self) -> SourceHandle {
        let id = self.next_source;
        self.next_source = self.next_source.wrapping_add(1);
        tracing::debug!(source = id, "Registered entropy source");
        SourceHandle::new(id, self.clock.now())
    }

    /// Adds a sample from a registered source to its next pool.
    pub fn add_sample(
        &mut self,
        source: &mut SourceHandle,
        data: &[u8],
    ) -> Result<(), AccumulatorError> {
        let pool = source.next_pool();
        self.add_random_event(source.id(), pool, data)
    }

    /// Adds the time elapsed since the source's previous timestamp.
    ///
    /// Suited to event arrival times (packets, key presses) that an
    /// attacker cannot observe exactly.
    pub fn add_timestamp(
        &mut self,
        source: &mut SourceHandle,
        at: Instant,
    ) -> Result<(), AccumulatorError> {
        let event = source.interval_event(at);
        self.add_sample(source, &event)
    }

    /// Feeds samples from the operating system RNG into every pool.
    ///
    /// Afterwards pool 0 holds enough data for the next request to
    /// reseed.
    pub fn add_os_entropy(&mut self) -> Result<(), AccumulatorError> {
        let mut source = self.register_source();
        let mut buf = [0u8; MAX_EVENT_SIZE];

        let mut result = Ok(());
        for _ in 0..OS_ENTROPY_SAMPLES {
            result = OsRng
                .try_fill_bytes(&mut buf)
                .map_err(|e| AccumulatorError::EntropySource(e.to_string()))
                .and_then(|()| self.add_sample(&mut source, &buf));
            if result.is_err() {
                break;
            }
        }
        buf.zeroize();

        if result.is_ok() {
            tracing::info!(
                source = source.id(),
                samples = OS_ENTROPY_SAMPLES,
                "Added operating system entropy"
            );
        }
        result
    }

    /// Returns `n` random bytes, reseeding first if the policy allows.
    pub fn random_data(&mut self, n: usize) -> Result<Vec<u8>, AccumulatorError> {
        let mut out = vec![0u8; n];
        self.fill(&mut out)?;
        Ok(out)
    }

    /// Fills `dest` with random bytes, reseeding first if the policy
    /// allows.
    pub fn fill(&mut self, dest: &mut [u8]) -> Result<(), AccumulatorError> {
        if !self.generator.is_seeded() && self.pools[0].is_empty() {
            return Err(AccumulatorError::InsufficientEntropy);
        }

        let now = self.clock.now();
        if self.reseed_due(now) {
            self.reseed(now);
        } else {
            tracing::debug!(
                pool_zero_size = self.pools[0].byte_count(),
                "Reseed not due"
            );
        }

        self.generator.fill(dest)?;
        self.bytes_generated += dest.len() as u64;
        Ok(())
    }

    /// Returns a snapshot of the accumulator counters.
    pub fn stats(&self) -> AccumulatorStats {
        AccumulatorStats {
            reseed_count: self.reseed_count,
            pool_sizes: std::array::from_fn(|i| self.pools[i].byte_count()),
            events_added: self.events_added,
            bytes_generated: self.bytes_generated,
            seeded: self.generator.is_seeded(),
        }
    }

    fn reseed_due(&self, now: Instant) -> bool {
        if self.pools[0].byte_count() < self.config.min_pool_size {
            return false;
        }
        // A clock reading before the last reseed counts as no time elapsed.
        self.last_reseed.map_or(true, |last| {
            now.saturating_duration_since(last) >= self.config.min_reseed_interval()
        })
    }

    fn reseed(&mut self, now: Instant) {
        self.reseed_count += 1;

        let mut seed = Vec::with_capacity(NUM_POOLS * DIGEST_SIZE);
        let mut used = Vec::new();
        for pool in self.pools.iter_mut() {
            if self.reseed_count % (1u64 << pool.id()) != 0 {
                continue;
            }
            seed.extend_from_slice(&pool.extract_and_reset());
            used.push(pool.id());
        }

        self.generator.reseed(&seed);
        seed.zeroize();
        self.last_reseed = Some(now);

        tracing::info!(
            reseed_count = self.reseed_count,
            pools = ?used,
            "Reseeded generator from entropy pools"
        );
    }
}

impl<K: Clock, C: BlockCipher> std::fmt::Debug for Accumulator<K, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accumulator")
            .field("config", &self.config)
            .field("reseed_count", &self.reseed_count)
            .field("pool_zero_size", &self.pools[0].byte_count())
            .field("generator", &self.generator)
            .finish_non_exhaustive()
    }
}

impl<K: Clock, C: BlockCipher> RngCore for Accumulator<K, C> {
    fn next_u32(&mut self) -> u32 {
        rand_core::impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        rand_core::impls::next_u64_via_fill(self)
    }

    /// # Panics
    ///
    /// Panics if the accumulator has not gathered enough entropy to seed
    /// its generator.
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        if let Err(err) = self.fill(dest) {
            panic!("{err}");
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill(dest).map_err(rand_core::Error::new)
    }
}

impl<K: Clock, C: BlockCipher> CryptoRng for Accumulator<K, C> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::ManualClock;
    use crate::primitives::Sha256d;
    use std::time::Duration;

    const INTERVAL: Duration = Duration::from_millis(100);

    // Reference output of the PyCrypto Fortuna accumulator.
    const FIRST_OUTPUT: [u8; 100] = [
        226, 104, 210, 56, 80, 187, 224, 232, 131, 211, 35, 163, 49, 237, 24, 137, 170, 13, 117,
        170, 229, 75, 237, 29, 33, 53, 46, 187, 21, 154, 18, 26, 157, 186, 69, 166, 241, 28, 148,
        72, 62, 241, 150, 175, 15, 70, 24, 125, 111, 133, 219, 77, 43, 112, 255, 243, 222, 152,
        218, 61, 101, 196, 45, 130, 161, 29, 73, 117, 91, 81, 24, 173, 24, 45, 48, 90, 222, 127,
        26, 195, 88, 191, 216, 22, 200, 245, 158, 162, 218, 10, 72, 243, 193, 132, 171, 27, 179,
        99, 54, 208,
    ];

    const THROTTLED_OUTPUT: [u8; 100] = [
        34, 163, 146, 161, 13, 93, 118, 204, 224, 58, 215, 141, 198, 90, 38, 26, 174, 151, 129, 91,
        249, 30, 91, 23, 199, 5, 180, 150, 94, 201, 10, 223, 129, 189, 162, 116, 22, 255, 130, 183,
        50, 39, 168, 7, 98, 138, 223, 129, 231, 222, 193, 66, 59, 187, 16, 100, 171, 169, 194, 12,
        197, 121, 10, 238, 39, 203, 43, 201, 110, 91, 56, 44, 56, 44, 246, 38, 25, 28, 94, 93, 65,
        183, 85, 46, 61, 132, 18, 96, 131, 16, 138, 241, 1, 22, 192, 249, 66, 242, 153, 112,
    ];

    const SECOND_RESEED_OUTPUT: [u8; 100] = [
        98, 9, 233, 102, 1, 195, 243, 88, 163, 4, 58, 74, 146, 155, 152, 92, 11, 229, 110, 108,
        123, 100, 237, 1, 151, 50, 103, 163, 120, 47, 209, 232, 249, 100, 33, 102, 126, 37, 133,
        104, 57, 148, 187, 255, 186, 232, 145, 182, 144, 141, 7, 12, 241, 184, 190, 72, 204, 123,
        227, 250, 14, 72, 4, 217, 167, 142, 222, 13, 245, 77, 224, 219, 176, 74, 20, 13, 151, 138,
        231, 135, 34, 192, 236, 5, 161, 249, 223, 212, 154, 198, 14, 222, 197, 232, 75, 199, 134,
        56, 58, 212,
    ];

    fn manual() -> (Accumulator<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let acc = Accumulator::with_clock(AccumulatorConfig::default(), clock.clone()).unwrap();
        (acc, clock)
    }

    /// Puts 68 bytes into pool 0.
    fn fill_pool_zero<K: Clock>(acc: &mut Accumulator<K>) {
        acc.add_random_event(0, 0, &[0u8; 32]).unwrap();
        acc.add_random_event(0, 0, &[0u8; 32]).unwrap();
    }

    #[test]
    fn test_reference_output() {
        let (mut acc, clock) = manual();

        fill_pool_zero(&mut acc);
        for i in 0..1000u32 {
            acc.add_random_event(1, (i % 32) as u8, &[1, 2]).unwrap();
        }
        assert_eq!(acc.random_data(100).unwrap(), FIRST_OUTPUT);
        assert_eq!(acc.reseed_count(), 1);

        fill_pool_zero(&mut acc);
        assert_eq!(acc.random_data(100).unwrap(), THROTTLED_OUTPUT);
        assert_eq!(acc.reseed_count(), 1);

        clock.advance(Duration::from_millis(200));
        assert_eq!(acc.random_data(100).unwrap(), SECOND_RESEED_OUTPUT);
        assert_eq!(acc.reseed_count(), 2);
    }

    #[test]
    fn test_no_entropy_rejected() {
        let (mut acc, _) = manual();
        assert!(matches!(
            acc.random_data(16),
            Err(AccumulatorError::InsufficientEntropy)
        ));

        // Entropy in other pools does not count.
        acc.add_random_event(0, 5, &[0u8; 32]).unwrap();
        assert!(matches!(
            acc.random_data(16),
            Err(AccumulatorError::InsufficientEntropy)
        ));
    }

    #[test]
    fn test_small_pool_zero_not_seeded() {
        let (mut acc, _) = manual();
        acc.add_random_event(0, 0, &[0u8; 32]).unwrap();

        assert!(matches!(
            acc.random_data(16),
            Err(AccumulatorError::Generator(GeneratorError::NotSeeded))
        ));
        assert_eq!(acc.reseed_count(), 0);
    }

    #[test]
    fn test_invalid_pool_index() {
        let (mut acc, _) = manual();
        assert!(matches!(
            acc.add_random_event(0, 32, &[1]),
            Err(AccumulatorError::InvalidPoolIndex(32))
        ));
        assert!(acc.add_random_event(0, 31, &[1]).is_ok());
        assert_eq!(acc.stats().events_added, 1);
    }

    #[test]
    fn test_event_framing_counts_header() {
        let (mut acc, _) = manual();
        acc.add_random_event(9, 3, &[1, 2, 3]).unwrap();
        acc.add_random_event(9, 3, &[]).unwrap();
        assert_eq!(acc.pool(3).unwrap().byte_count(), 5 + 2);
    }

    #[test]
    fn test_long_event_is_condensed() {
        let (mut acc, _) = manual();
        acc.add_random_event(0, 1, &[7u8; 100]).unwrap();
        assert_eq!(acc.pool(1).unwrap().byte_count(), 2 + 32);

        let mut expected = Pool::new(1);
        expected.add(&[0, 32]);
        expected.add(&Sha256::digest([7u8; 100]));

        let mut acc_pool = acc.pools[1].clone();
        assert_eq!(acc_pool.extract_and_reset(), expected.extract_and_reset());
    }

    #[test]
    fn test_interval_throttling() {
        let (mut acc, clock) = manual();
        fill_pool_zero(&mut acc);
        acc.random_data(16).unwrap();
        assert_eq!(acc.reseed_count(), 1);

        // Fresh entropy, but the interval has not elapsed.
        fill_pool_zero(&mut acc);
        clock.advance(INTERVAL - Duration::from_millis(1));
        acc.random_data(16).unwrap();
        assert_eq!(acc.reseed_count(), 1);

        clock.advance(Duration::from_millis(1));
        acc.random_data(16).unwrap();
        assert_eq!(acc.reseed_count(), 2);
    }

    #[test]
    fn test_throttled_request_continues_stream() {
        let (mut acc, _) = manual();
        fill_pool_zero(&mut acc);
        acc.random_data(16).unwrap();
        fill_pool_zero(&mut acc);

        // Within the interval the generator just keeps going.
        let mut gen: Generator = Generator::new();
        let header: &[u8] = &[0, 32];
        let event: &[u8] = &[0u8; 32];
        gen.reseed(&Sha256d::digest_parts(&[header, event, header, event]));
        gen.generate(16).unwrap();

        assert_eq!(acc.random_data(16).unwrap(), gen.generate(16).unwrap());
        assert_eq!(acc.pool(0).unwrap().byte_count(), 68);
    }

    #[test]
    fn test_elapsed_interval_without_entropy_does_not_reseed() {
        let (mut acc, clock) = manual();
        fill_pool_zero(&mut acc);
        acc.random_data(16).unwrap();

        clock.advance(INTERVAL * 5);
        acc.random_data(16).unwrap();
        assert_eq!(acc.reseed_count(), 1);
    }

    #[test]
    fn test_pool_rotation_schedule() {
        let (mut acc, clock) = manual();

        for round in 1..=16u64 {
            for pool in 0..NUM_POOLS as u8 {
                acc.add_random_event(1, pool, &[0u8; 32]).unwrap();
                acc.add_random_event(1, pool, &[0u8; 32]).unwrap();
            }
            clock.advance(INTERVAL);
            acc.random_data(16).unwrap();
            assert_eq!(acc.reseed_count(), round);

            let sizes = acc.stats().pool_sizes;
            for (k, size) in sizes.iter().enumerate() {
                let included = round % (1u64 << k) == 0;
                assert_eq!(*size == 0, included, "round {round}, pool {k}");
            }
        }
    }

    #[test]
    fn test_pool_only_affects_scheduled_reseeds() {
        let (mut plain, plain_clock) = manual();
        let (mut marked, marked_clock) = manual();

        // Only difference: one extra event in pool 2, used by reseed 4.
        marked.add_random_event(3, 2, &[0xEE]).unwrap();

        for round in 1..=4u64 {
            for acc in [&mut plain, &mut marked] {
                fill_pool_zero(acc);
            }
            plain_clock.advance(INTERVAL);
            marked_clock.advance(INTERVAL);

            let a = plain.random_data(32).unwrap();
            let b = marked.random_data(32).unwrap();
            if round < 4 {
                assert_eq!(a, b, "round {round}");
            } else {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_registered_sources_rotate_pools() {
        let (mut acc, _) = manual();
        let mut first = acc.register_source();
        let mut second = acc.register_source();
        assert_eq!(first.id(), 0);
        assert_eq!(second.id(), 1);

        for _ in 0..33 {
            acc.add_sample(&mut first, &[1, 2]).unwrap();
        }
        acc.add_sample(&mut second, &[1, 2]).unwrap();

        let sizes = acc.stats().pool_sizes;
        assert_eq!(sizes[0], 8 + 4);
        assert_eq!(sizes[1], 4);
        assert_eq!(sizes[31], 4);
    }

    #[test]
    fn test_timestamps_feed_pools() {
        let (mut acc, clock) = manual();
        let mut source = acc.register_source();

        clock.advance(Duration::from_micros(1500));
        acc.add_timestamp(&mut source, clock.now()).unwrap();

        assert_eq!(acc.pool(0).unwrap().byte_count(), 2 + 8);
        assert_eq!(source.events_submitted(), 1);
    }

    #[test]
    fn test_os_entropy_allows_output() {
        let mut acc = Accumulator::new();
        acc.add_os_entropy().unwrap();

        assert_eq!(acc.stats().events_added, OS_ENTROPY_SAMPLES as u64);
        assert_eq!(acc.random_data(64).unwrap().len(), 64);
        assert_eq!(acc.reseed_count(), 1);
    }

    #[test]
    fn test_stats_track_output() {
        let (mut acc, _) = manual();
        fill_pool_zero(&mut acc);
        acc.random_data(10).unwrap();
        acc.random_data(0).unwrap();
        acc.random_data(5).unwrap();

        let stats = acc.stats();
        assert!(stats.seeded);
        assert_eq!(stats.bytes_generated, 15);
        assert_eq!(stats.events_added, 2);
    }

    #[test]
    fn test_rng_core_interface() {
        let (mut acc, _) = manual();
        fill_pool_zero(&mut acc);

        let mut buf = [0u8; 24];
        acc.try_fill_bytes(&mut buf).unwrap();
        assert_ne!(buf, [0u8; 24]);
        let _ = acc.next_u64();
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let config = AccumulatorConfig {
            min_pool_size: 0,
            ..Default::default()
        };
        assert!(Accumulator::with_config(config).is_err());
    }
}
