use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecutorMetricsSnapshot {
    pub performed: u64,
    pub settled: u64,
    pub no_navigation: u64,
    pub skipped_wait: u64,
    pub timeouts: u64,
    pub input_failures: u64,
    pub cancelled: u64,
}

static PERFORMED: AtomicU64 = AtomicU64::new(0);
static SETTLED: AtomicU64 = AtomicU64::new(0);
static NO_NAVIGATION: AtomicU64 = AtomicU64::new(0);
static SKIPPED_WAIT: AtomicU64 = AtomicU64::new(0);
static TIMEOUTS: AtomicU64 = AtomicU64::new(0);
static INPUT_FAILURES: AtomicU64 = AtomicU64::new(0);
static CANCELLED: AtomicU64 = AtomicU64::new(0);

pub fn record_performed() {
    PERFORMED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_settled() {
    SETTLED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_no_navigation() {
    NO_NAVIGATION.fetch_add(1, Ordering::Relaxed);
}

pub fn record_skipped_wait() {
    SKIPPED_WAIT.fetch_add(1, Ordering::Relaxed);
}

pub fn record_timeout() {
    TIMEOUTS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_input_failure() {
    INPUT_FAILURES.fetch_add(1, Ordering::Relaxed);
}

pub fn record_cancelled() {
    CANCELLED.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> ExecutorMetricsSnapshot {
    ExecutorMetricsSnapshot {
        performed: PERFORMED.load(Ordering::Relaxed),
        settled: SETTLED.load(Ordering::Relaxed),
        no_navigation: NO_NAVIGATION.load(Ordering::Relaxed),
        skipped_wait: SKIPPED_WAIT.load(Ordering::Relaxed),
        timeouts: TIMEOUTS.load(Ordering::Relaxed),
        input_failures: INPUT_FAILURES.load(Ordering::Relaxed),
        cancelled: CANCELLED.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    PERFORMED.store(0, Ordering::Relaxed);
    SETTLED.store(0, Ordering::Relaxed);
    NO_NAVIGATION.store(0, Ordering::Relaxed);
    SKIPPED_WAIT.store(0, Ordering::Relaxed);
    TIMEOUTS.store(0, Ordering::Relaxed);
    INPUT_FAILURES.store(0, Ordering::Relaxed);
    CANCELLED.store(0, Ordering::Relaxed);
}
