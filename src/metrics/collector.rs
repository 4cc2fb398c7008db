//! Metrics collection and registry.

use crate::accumulator::AccumulatorStats;
use prometheus::{Encoder, IntCounter, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Prometheus metrics registry for accumulator monitoring.
pub struct MetricsRegistry {
    registry: Registry,

    // Generator metrics
    seeded: IntGauge,
    reseed_total: IntCounter,
    generated_bytes_total: IntCounter,

    // Pool metrics
    events_total: IntCounter,
    pool_size_bytes: IntGaugeVec,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all accumulator metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        // Generator metrics
        let seeded = IntGauge::new(
            "fortuna_generator_seeded",
            "Whether the generator has been seeded (1=seeded, 0=unseeded)",
        )?;
        let reseed_total = IntCounter::new(
            "fortuna_reseed_total",
            "Total number of generator reseeds performed",
        )?;
        let generated_bytes_total = IntCounter::new(
            "fortuna_generated_bytes_total",
            "Total number of random bytes handed out",
        )?;

        // Pool metrics
        let events_total = IntCounter::new(
            "fortuna_events_total",
            "Total number of entropy events accepted",
        )?;
        let pool_size_bytes = IntGaugeVec::new(
            Opts::new(
                "fortuna_pool_size_bytes",
                "Bytes held by each entropy pool since its last reseed",
            ),
            &["pool"],
        )?;

        // Register all metrics
        registry.register(Box::new(seeded.clone()))?;
        registry.register(Box::new(reseed_total.clone()))?;
        registry.register(Box::new(generated_bytes_total.clone()))?;
        registry.register(Box::new(events_total.clone()))?;
        registry.register(Box::new(pool_size_bytes.clone()))?;

        Ok(Self {
            registry,
            seeded,
            reseed_total,
            generated_bytes_total,
            events_total,
            pool_size_bytes,
        })
    }

    /// Updates all metrics from a snapshot of accumulator state.
    pub fn update(&self, stats: &AccumulatorStats) {
        self.seeded.set(i64::from(stats.seeded));

        // Counters only move forward, so add the difference
        advance_counter(&self.reseed_total, stats.reseed_count);
        advance_counter(&self.generated_bytes_total, stats.bytes_generated);
        advance_counter(&self.events_total, stats.events_added);

        for (pool, size) in stats.pool_sizes.iter().enumerate() {
            let label = pool.to_string();
            self.pool_size_bytes
                .with_label_values(&[label.as_str()])
                .set(i64::try_from(*size).unwrap_or(i64::MAX));
        }
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance_counter(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::NUM_POOLS;

    fn stats() -> AccumulatorStats {
        let mut pool_sizes = [0u64; NUM_POOLS];
        pool_sizes[0] = 68;
        pool_sizes[5] = 4;
        AccumulatorStats {
            reseed_count: 2,
            pool_sizes,
            events_added: 1002,
            bytes_generated: 300,
            seeded: true,
        }
    }

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();
        registry.update(&stats());

        let output = registry.encode().unwrap();
        assert!(output.contains("fortuna_generator_seeded 1"));
        assert!(output.contains("fortuna_reseed_total 2"));
        assert!(output.contains("fortuna_generated_bytes_total 300"));
        assert!(output.contains("fortuna_pool_size_bytes{pool=\"0\"} 68"));
        assert!(output.contains("fortuna_pool_size_bytes{pool=\"5\"} 4"));
    }

    #[test]
    fn test_counters_never_decrease() {
        let registry = MetricsRegistry::new().unwrap();
        registry.update(&stats());

        let mut older = stats();
        older.reseed_count = 1;
        registry.update(&older);

        let output = registry.encode().unwrap();
        assert!(output.contains("fortuna_reseed_total 2"));
    }

    #[test]
    fn test_metrics_encode() {
        let registry = MetricsRegistry::new().unwrap();
        let output = registry.encode().unwrap();

        // Should contain metric names
        assert!(output.contains("fortuna_generator_seeded"));
        assert!(output.contains("fortuna_reseed_total"));
        assert!(output.contains("fortuna_events_total"));
    }
}
