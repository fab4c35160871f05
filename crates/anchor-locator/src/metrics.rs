//! Telemetry helpers for the locator.
//!
//! Process-wide counters and latency aggregates so the CLI can report how
//! anchors were recovered without an external metrics backend.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::types::LocatorStrategy;

const TIERS: usize = 6;

static LOCATE_TOTAL: AtomicU64 = AtomicU64::new(0);
static LOCATE_NOT_FOUND: AtomicU64 = AtomicU64::new(0);
static LOCATE_BY_TIER: [AtomicU64; TIERS] = [
    AtomicU64::new(0),
    AtomicU64::new(0),
    AtomicU64::new(0),
    AtomicU64::new(0),
    AtomicU64::new(0),
    AtomicU64::new(0),
];
static LOCATE_LAT_NS: AtomicU64 = AtomicU64::new(0);
static LOCATE_LAT_SAMPLES: AtomicU64 = AtomicU64::new(0);

static SIGNATURE_TOTAL: AtomicU64 = AtomicU64::new(0);
static SIGNATURE_HIT: AtomicU64 = AtomicU64::new(0);
static SIGNATURE_LAT_NS: AtomicU64 = AtomicU64::new(0);
static SIGNATURE_LAT_SAMPLES: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricCounter {
    pub total: u64,
    pub avg_ms: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TierCounts {
    pub identity_mark: u64,
    pub selector: u64,
    pub parent_chain: u64,
    pub text_content: u64,
    pub stable_class: u64,
    pub position: u64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricSnapshot {
    pub locate: MetricCounter,
    pub not_found: u64,
    pub by_tier: TierCounts,
    pub signature: MetricCounter,
    pub signature_hits: u64,
}

pub fn record_locate(strategy: Option<LocatorStrategy>, duration: Duration) {
    LOCATE_TOTAL.fetch_add(1, Ordering::Relaxed);
    match strategy {
        Some(strategy) => {
            LOCATE_BY_TIER[strategy.index()].fetch_add(1, Ordering::Relaxed);
        }
        None => {
            LOCATE_NOT_FOUND.fetch_add(1, Ordering::Relaxed);
        }
    }
    record_latency(&LOCATE_LAT_NS, &LOCATE_LAT_SAMPLES, duration);
}

pub fn record_signature(hit: bool, duration: Duration) {
    SIGNATURE_TOTAL.fetch_add(1, Ordering::Relaxed);
    if hit {
        SIGNATURE_HIT.fetch_add(1, Ordering::Relaxed);
    }
    record_latency(&SIGNATURE_LAT_NS, &SIGNATURE_LAT_SAMPLES, duration);
}

pub fn snapshot() -> MetricSnapshot {
    let tier = |strategy: LocatorStrategy| LOCATE_BY_TIER[strategy.index()].load(Ordering::Relaxed);
    MetricSnapshot {
        locate: make_counter(
            LOCATE_TOTAL.load(Ordering::Relaxed),
            LOCATE_LAT_NS.load(Ordering::Relaxed),
            LOCATE_LAT_SAMPLES.load(Ordering::Relaxed),
        ),
        not_found: LOCATE_NOT_FOUND.load(Ordering::Relaxed),
        by_tier: TierCounts {
            identity_mark: tier(LocatorStrategy::IdentityMark),
            selector: tier(LocatorStrategy::Selector),
            parent_chain: tier(LocatorStrategy::ParentChain),
            text_content: tier(LocatorStrategy::TextContent),
            stable_class: tier(LocatorStrategy::StableClass),
            position: tier(LocatorStrategy::Position),
        },
        signature: make_counter(
            SIGNATURE_TOTAL.load(Ordering::Relaxed),
            SIGNATURE_LAT_NS.load(Ordering::Relaxed),
            SIGNATURE_LAT_SAMPLES.load(Ordering::Relaxed),
        ),
        signature_hits: SIGNATURE_HIT.load(Ordering::Relaxed),
    }
}

fn make_counter(total: u64, nanos: u64, samples: u64) -> MetricCounter {
    let avg_ms = if samples == 0 {
        0.0
    } else {
        (nanos as f64 / samples as f64) / 1_000_000.0
    };
    MetricCounter { total, avg_ms }
}

fn record_latency(total_ns: &AtomicU64, samples: &AtomicU64, duration: Duration) {
    let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
    total_ns.fetch_add(nanos, Ordering::Relaxed);
    samples.fetch_add(1, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_advance() {
        let before = snapshot();
        record_locate(Some(LocatorStrategy::Position), Duration::from_micros(5));
        record_locate(None, Duration::from_micros(5));
        record_signature(true, Duration::from_micros(1));
        let after = snapshot();

        assert!(after.locate.total >= before.locate.total + 2);
        assert!(after.by_tier.position > before.by_tier.position);
        assert!(after.not_found > before.not_found);
        assert!(after.signature_hits > before.signature_hits);
    }
}
