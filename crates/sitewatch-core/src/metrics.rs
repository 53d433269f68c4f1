//! Global atomic counters for diagnostics activity.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. when the server shuts down).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    classifications: AtomicU64,
    fallback_classifications: AtomicU64,
    retries_recommended: AtomicU64,
    retries_declined: AtomicU64,
    tool_calls: AtomicU64,
    tool_failures: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            classifications: AtomicU64::new(0),
            fallback_classifications: AtomicU64::new(0),
            retries_recommended: AtomicU64::new(0),
            retries_declined: AtomicU64::new(0),
            tool_calls: AtomicU64::new(0),
            tool_failures: AtomicU64::new(0),
        }
    }

    /// Count one classification; `fallback` when no rule matched.
    pub fn inc_classifications(&self, fallback: bool) {
        self.classifications.fetch_add(1, Ordering::Relaxed);
        if fallback {
            self.fallback_classifications.fetch_add(1, Ordering::Relaxed);
        }
        tracing::trace!(metric = "classifications", fallback, "counter incremented");
    }

    /// Count one retry decision.
    pub fn inc_retry_decisions(&self, recommended: bool) {
        if recommended {
            self.retries_recommended.fetch_add(1, Ordering::Relaxed);
        } else {
            self.retries_declined.fetch_add(1, Ordering::Relaxed);
        }
        tracing::trace!(metric = "retry_decisions", recommended, "counter incremented");
    }

    pub fn inc_tool_calls(&self) {
        self.tool_calls.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "tool_calls", "counter incremented");
    }

    pub fn inc_tool_failures(&self) {
        self.tool_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "tool_failures", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            classifications = self.classifications(),
            fallback_classifications = self.fallback_classifications(),
            retries_recommended = self.retries_recommended(),
            retries_declined = self.retries_declined(),
            tool_calls = self.tool_calls(),
            tool_failures = self.tool_failures(),
        );
    }

    pub fn classifications(&self) -> u64 {
        self.classifications.load(Ordering::Relaxed)
    }

    pub fn fallback_classifications(&self) -> u64 {
        self.fallback_classifications.load(Ordering::Relaxed)
    }

    pub fn retries_recommended(&self) -> u64 {
        self.retries_recommended.load(Ordering::Relaxed)
    }

    pub fn retries_declined(&self) -> u64 {
        self.retries_declined.load(Ordering::Relaxed)
    }

    pub fn tool_calls(&self) -> u64 {
        self.tool_calls.load(Ordering::Relaxed)
    }

    pub fn tool_failures(&self) -> u64 {
        self.tool_failures.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.classifications.store(0, Ordering::Relaxed);
        self.fallback_classifications.store(0, Ordering::Relaxed);
        self.retries_recommended.store(0, Ordering::Relaxed);
        self.retries_declined.store(0, Ordering::Relaxed);
        self.tool_calls.store(0, Ordering::Relaxed);
        self.tool_failures.store(0, Ordering::Relaxed);
    }
}
