//! # Correlation Id Generator
//!
//! Issues [`CorrelationId`]s derived from wall-clock milliseconds.
//!
//! Two requests issued within the same millisecond (or while the clock steps
//! backwards) must still get distinct ids, so every id is at least one
//! greater than the previously issued one.

use shared_types::entities::CorrelationId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Monotonic, timestamp-seeded id source.
#[derive(Debug, Default)]
pub struct CorrelationIdGenerator {
    last: AtomicU64,
}

impl CorrelationIdGenerator {
    /// Create a generator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Issue the next id: `max(now_ms, last + 1)`.
    pub fn next_id(&self) -> CorrelationId {
        let now = Self::current_millis();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(prev, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return CorrelationId(candidate),
                Err(actual) => prev = actual,
            }
        }
    }

    /// Get current Unix time in milliseconds.
    fn current_millis() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
