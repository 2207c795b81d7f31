use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackerMetricsSnapshot {
    pub started: u64,
    pub committed: u64,
    pub superseded: u64,
    pub aborted: u64,
    pub lifecycle: u64,
    pub evicted: u64,
}

static STARTED: AtomicU64 = AtomicU64::new(0);
static COMMITTED: AtomicU64 = AtomicU64::new(0);
static SUPERSEDED: AtomicU64 = AtomicU64::new(0);
static ABORTED: AtomicU64 = AtomicU64::new(0);
static LIFECYCLE: AtomicU64 = AtomicU64::new(0);
static EVICTED: AtomicU64 = AtomicU64::new(0);

pub fn record_started() {
    STARTED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_committed() {
    COMMITTED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_superseded() {
    SUPERSEDED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_aborted() {
    ABORTED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_lifecycle() {
    LIFECYCLE.fetch_add(1, Ordering::Relaxed);
}

pub fn record_evicted() {
    EVICTED.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> TrackerMetricsSnapshot {
    TrackerMetricsSnapshot {
        started: STARTED.load(Ordering::Relaxed),
        committed: COMMITTED.load(Ordering::Relaxed),
        superseded: SUPERSEDED.load(Ordering::Relaxed),
        aborted: ABORTED.load(Ordering::Relaxed),
        lifecycle: LIFECYCLE.load(Ordering::Relaxed),
        evicted: EVICTED.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    STARTED.store(0, Ordering::Relaxed);
    COMMITTED.store(0, Ordering::Relaxed);
    SUPERSEDED.store(0, Ordering::Relaxed);
    ABORTED.store(0, Ordering::Relaxed);
    LIFECYCLE.store(0, Ordering::Relaxed);
    EVICTED.store(0, Ordering::Relaxed);
}
