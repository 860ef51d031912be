//! Metrics aggregator.

use growthos_core::{Metrics, MetricsDelta};

/// Owner of the single mutable [`Metrics`] snapshot.
///
/// Lives inside the engine state lock; callers publish the snapshot in the
/// same critical section as the delta that produced it.
#[derive(Debug, Default)]
pub struct MetricsAggregator {
    current: Metrics,
}

impl MetricsAggregator {
    /// Start at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current counters.
    #[must_use]
    pub fn snapshot(&self) -> Metrics {
        self.current.clone()
    }

    /// Borrow the current counters.
    #[must_use]
    pub fn current(&self) -> &Metrics {
        &self.current
    }

    /// Apply one transition's delta.
    pub fn apply(&mut self, delta: &MetricsDelta) {
        self.current.apply(delta);
        debug_assert!(self.current.is_consistent());
    }

    /// Zero every counter.
    pub fn reset(&mut self) {
        self.current.reset();
    }
}
