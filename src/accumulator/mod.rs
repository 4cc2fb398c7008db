//! Entropy accumulation and reseed scheduling.
//!
//! The accumulator collects entropy events into 32 pools and decides
//! when the generator gets reseeded and from which pools. Time is read
//! through the [`Clock`] trait so the schedule can be driven manually.

mod clock;
mod config;
mod engine;
mod pool;
mod shared;
mod source;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AccumulatorConfig, ConfigError};
pub use engine::{Accumulator, AccumulatorError, AccumulatorStats};
pub use pool::{Pool, NUM_POOLS};
pub use shared::SharedAccumulator;
pub use source::{SourceHandle, MAX_EVENT_SIZE};
