//! Prometheus metrics for accumulator monitoring.
//!
//! # Metrics Exposed
//!
//! ## Generator Metrics
//! - `fortuna_generator_seeded` - Whether the generator has been seeded
//! - `fortuna_reseed_total` - Total reseeds performed
//! - `fortuna_generated_bytes_total` - Random bytes handed out
//!
//! ## Pool Metrics
//! - `fortuna_events_total` - Entropy events accepted
//! - `fortuna_pool_size_bytes{pool}` - Bytes held by each pool
//!
//! # Example
//!
//! ```
//! use fortuna_vectors::{accumulator::Accumulator, metrics::MetricsRegistry};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! let acc = Accumulator::new();
//!
//! registry.update(&acc.stats());
//! let text = registry.encode().expect("Failed to encode metrics");
//! assert!(text.contains("fortuna_reseed_total 0"));
//! ```

mod collector;

pub use collector::{MetricsError, MetricsRegistry};
