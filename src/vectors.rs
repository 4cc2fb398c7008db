//! Reference vector scenarios.
//!
//! Each scenario drives the generator or the accumulator through a fixed
//! sequence of calls and records the output. The accumulator scenario
//! uses a [`ManualClock`], so the 200 ms pause between its last two
//! requests is simulated and the result never depends on scheduling.

use crate::accumulator::{
    Accumulator, AccumulatorConfig, AccumulatorError, AccumulatorStats, ConfigError, ManualClock,
};
use crate::generator::{Generator, GeneratorError, MAX_BYTES_PER_KEY};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bytes recorded per vector.
pub const VECTOR_LEN: usize = 100;

/// Values per line in Go output.
const GO_VALUES_PER_LINE: usize = 15;

/// Errors that can occur while computing vectors.
#[derive(Debug, Error)]
pub enum VectorError {
    #[error("generator failed: {0}")]
    Generator(#[from] GeneratorError),
    #[error("accumulator failed: {0}")]
    Accumulator(#[from] AccumulatorError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Output format for printed vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Go byte slice literals, ready to paste into a test.
    #[default]
    Go,
    /// One lowercase hex string per vector.
    Hex,
}

/// A named reference byte sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceVector {
    /// Identifier, also used as the Go variable name.
    pub name: &'static str,
    /// The recorded output.
    pub bytes: Vec<u8>,
}

impl ReferenceVector {
    fn new(name: &'static str, bytes: Vec<u8>) -> Self {
        Self { name, bytes }
    }

    /// Renders the vector in the given format.
    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Go => self.to_go(),
            OutputFormat::Hex => self.to_hex(),
        }
    }

    /// Renders the vector as a Go `[]byte` literal.
    pub fn to_go(&self) -> String {
        let mut out = format!("\t{} := []byte{{", self.name);
        for (i, byte) in self.bytes.iter().enumerate() {
            if i % GO_VALUES_PER_LINE == 0 {
                out.push_str("\n\t\t");
            } else {
                out.push(' ');
            }
            out.push_str(&format!("{byte},"));
        }
        out.push_str("\n\t}\n");
        out
    }

    /// Renders the vector as `name: hex`.
    pub fn to_hex(&self) -> String {
        let hex: String = self.bytes.iter().map(|b| format!("{b:02x}")).collect();
        format!("{}: {}\n", self.name, hex)
    }
}

/// Result of the accumulator scenario.
#[derive(Debug, Clone)]
pub struct AccumulatorRun {
    /// Vectors in the order they were produced.
    pub vectors: Vec<ReferenceVector>,
    /// Accumulator counters after the last request.
    pub stats: AccumulatorStats,
}

/// Runs the generator scenario.
///
/// 1. reseed with `{1, 2, 3, 4}` and take 100 bytes;
/// 2. request `2^20 + 100` bytes and keep the last 100, which are
///    produced after the mid-request rekey;
/// 3. reseed with `{5}` and take 100 bytes.
pub fn generator_vectors() -> Result<Vec<ReferenceVector>, VectorError> {
    let mut gen: Generator = Generator::new();

    gen.reseed(&[1, 2, 3, 4]);
    let first = gen.generate(VECTOR_LEN)?;

    let mut long = gen.generate(MAX_BYTES_PER_KEY + VECTOR_LEN)?;
    let tail = long.split_off(MAX_BYTES_PER_KEY);

    gen.reseed(&[5]);
    let reseeded = gen.generate(VECTOR_LEN)?;

    tracing::debug!("Computed generator vectors");

    Ok(vec![
        ReferenceVector::new("seed1234", first),
        ReferenceVector::new("seed1234Tail", tail),
        ReferenceVector::new("reseed5", reseeded),
    ])
}

/// Runs the accumulator scenario.
///
/// 1. two 32-byte zero events into pool 0, then 1000 events `{1, 2}`
///    from source 1 spread over all pools; take 100 bytes (reseed 1);
/// 2. two more zero events into pool 0; take 100 bytes immediately,
///    which the reseed interval throttles;
/// 3. let twice the reseed interval pass; take 100 bytes (reseed 2,
///    using pools 0 and 1).
pub fn accumulator_vectors(config: &AccumulatorConfig) -> Result<AccumulatorRun, VectorError> {
    let clock = ManualClock::new();
    let mut acc: Accumulator<ManualClock> = Accumulator::with_clock(config.clone(), clock.clone())?;

    add_zero_events(&mut acc)?;
    for i in 0..1000u32 {
        acc.add_random_event(1, (i % 32) as u8, &[1, 2])?;
    }
    let first = acc.random_data(VECTOR_LEN)?;

    add_zero_events(&mut acc)?;
    let throttled = acc.random_data(VECTOR_LEN)?;

    clock.advance(config.min_reseed_interval() * 2);
    let second = acc.random_data(VECTOR_LEN)?;

    let stats = acc.stats();
    tracing::debug!(
        reseed_count = stats.reseed_count,
        "Computed accumulator vectors"
    );

    Ok(AccumulatorRun {
        vectors: vec![
            ReferenceVector::new("accumulatorFirst", first),
            ReferenceVector::new("accumulatorThrottled", throttled),
            ReferenceVector::new("accumulatorSecondReseed", second),
        ],
        stats,
    })
}

fn add_zero_events(acc: &mut Accumulator<ManualClock>) -> Result<(), AccumulatorError> {
    acc.add_random_event(0, 0, &[0u8; 32])?;
    acc.add_random_event(0, 0, &[0u8; 32])
}
