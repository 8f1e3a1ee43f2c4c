//! A monotonically increasing simulation clock, seeded at startup.
//!
//! Wall-clock timestamps would make replay nondeterministic: re-feeding the
//! same audit log twice would stamp entries differently each time. Instead
//! every `now()` call advances a counter from a fixed base instant, so two
//! runs seeded identically produce byte-identical timestamps.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};

/// Deterministic timestamp source for audit entries and published events.
pub struct SimClock {
    base: DateTime<Utc>,
    ticks: AtomicU64,
}

impl SimClock {
    /// Seed a clock at a fixed base instant.
    #[must_use]
    pub const fn new(base: DateTime<Utc>) -> Self {
        Self { base, ticks: AtomicU64::new(0) }
    }

    /// Advance and return the next timestamp, one millisecond after the last.
    pub fn now(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed);
        let millis = i64::try_from(tick).unwrap_or(i64::MAX);
        self.base + Duration::milliseconds(millis)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn successive_calls_strictly_advance() {
        let clock = SimClock::new(Utc::now());
        let first = clock.now();
        let second = clock.now();
        assert!(second > first);
    }

    #[test]
    fn same_base_produces_same_sequence() {
        let base = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").expect("valid timestamp").with_timezone(&Utc);
        let a = SimClock::new(base);
        let b = SimClock::new(base);
        let sequence_a: Vec<DateTime<Utc>> = (0..5).map(|_| a.now()).collect();
        let sequence_b: Vec<DateTime<Utc>> = (0..5).map(|_| b.now()).collect();
        assert_eq!(sequence_a, sequence_b);
    }
}
