use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Request counters for monitoring
#[derive(Clone)]
pub struct Metrics {
    pub lists_served: Arc<AtomicU64>,
    pub lookups_served: Arc<AtomicU64>,
    pub records_created: Arc<AtomicU64>,
    pub records_saved: Arc<AtomicU64>,
    pub storage_errors: Arc<AtomicU64>,
    pub start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            lists_served: Arc::new(AtomicU64::new(0)),
            lookups_served: Arc::new(AtomicU64::new(0)),
            records_created: Arc::new(AtomicU64::new(0)),
            records_saved: Arc::new(AtomicU64::new(0)),
            storage_errors: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn inc_lists(&self) {
        self.lists_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_lookups(&self) {
        self.lookups_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_created(&self) {
        self.records_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_saved(&self) {
        self.records_saved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_storage_errors(&self) {
        self.storage_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lists_served: self.lists_served.load(Ordering::Relaxed),
            lookups_served: self.lookups_served.load(Ordering::Relaxed),
            records_created: self.records_created.load(Ordering::Relaxed),
            records_saved: self.records_saved.load(Ordering::Relaxed),
            storage_errors: self.storage_errors.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub lists_served: u64,
    pub lookups_served: u64,
    pub records_created: u64,
    pub records_saved: u64,
    pub storage_errors: u64,
    pub uptime_seconds: u64,
}
