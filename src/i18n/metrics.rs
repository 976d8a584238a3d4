//! Translation loader metrics.
//!
//! Each [`TranslationLoader`](super::TranslationLoader) owns its own
//! counters, so independent pages (and tests) never share state.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for one translation loader.
#[derive(Debug, Default)]
pub struct LoaderMetrics {
    /// Loads served from the in-memory cache
    cache_hits: AtomicUsize,

    /// Loads that had to go to the network
    cache_misses: AtomicUsize,

    /// Individual fetch attempts, retries included
    fetch_attempts: AtomicUsize,

    /// Fetch attempts that failed
    fetch_failures: AtomicUsize,

    /// Loads that gave up after the last attempt
    exhausted_loads: AtomicUsize,
}

impl LoaderMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_attempt(&self) {
        self.fetch_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_exhausted(&self) {
        self.exhausted_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn fetch_attempts(&self) -> usize {
        self.fetch_attempts.load(Ordering::Relaxed)
    }

    pub fn fetch_failures(&self) -> usize {
        self.fetch_failures.load(Ordering::Relaxed)
    }

    pub fn exhausted_loads(&self) -> usize {
        self.exhausted_loads.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let total_loads = hits + misses;
        let cache_hit_rate = if total_loads > 0 {
            (hits as f64 / total_loads as f64) * 100.0
        } else {
            0.0
        };

        let attempts = self.fetch_attempts();
        let failures = self.fetch_failures();
        let fetch_success_rate = if attempts > 0 {
            ((attempts - failures) as f64 / attempts as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            fetch_attempts: attempts,
            fetch_failures: failures,
            fetch_success_rate,
            exhausted_loads: self.exhausted_loads(),
        }
    }
}

/// Point-in-time loader statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub cache_hits: usize,
    pub cache_misses: usize,

    /// Cache hit rate as a percentage (0-100)
    pub cache_hit_rate: f64,

    pub fetch_attempts: usize,
    pub fetch_failures: usize,

    /// Fetch success rate as a percentage (0-100)
    pub fetch_success_rate: f64,

    pub exhausted_loads: usize,
}
