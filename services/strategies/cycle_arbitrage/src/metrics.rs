//! Detection service metrics

use crate::detector::PassReport;
use pool_graph::DrainReport;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Thread-safe counters for the detection service
#[derive(Debug)]
pub struct DetectorMetrics {
    start_time: Instant,
    passes: AtomicU64,
    aborted_passes: AtomicU64,
    candidates: AtomicU64,
    opportunities: AtomicU64,
    path_failures: AtomicU64,
    updates_applied: AtomicU64,
    updates_stale: AtomicU64,
    updates_rejected: AtomicU64,
    updates_dropped: AtomicU64,
}

/// Point-in-time copy of [`DetectorMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub passes: u64,
    pub aborted_passes: u64,
    pub candidates: u64,
    pub opportunities: u64,
    pub path_failures: u64,
    pub updates_applied: u64,
    pub updates_stale: u64,
    pub updates_rejected: u64,
    /// Refused by a full queue
    pub updates_dropped: u64,
}

impl DetectorMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            passes: AtomicU64::new(0),
            aborted_passes: AtomicU64::new(0),
            candidates: AtomicU64::new(0),
            opportunities: AtomicU64::new(0),
            path_failures: AtomicU64::new(0),
            updates_applied: AtomicU64::new(0),
            updates_stale: AtomicU64::new(0),
            updates_rejected: AtomicU64::new(0),
            updates_dropped: AtomicU64::new(0),
        }
    }

    pub fn record_pass(&self, report: &PassReport) {
        self.passes.fetch_add(1, Ordering::Relaxed);
        self.candidates
            .fetch_add(report.candidates as u64, Ordering::Relaxed);
        self.opportunities
            .fetch_add(report.opportunities.len() as u64, Ordering::Relaxed);
        self.path_failures
            .fetch_add(report.failures.len() as u64, Ordering::Relaxed);
    }

    pub fn record_aborted_pass(&self) {
        self.aborted_passes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_drain(&self, report: &DrainReport) {
        self.updates_applied
            .fetch_add(report.applied as u64, Ordering::Relaxed);
        self.updates_stale
            .fetch_add(report.stale as u64, Ordering::Relaxed);
        self.updates_rejected
            .fetch_add(report.rejected as u64, Ordering::Relaxed);
    }

    pub fn record_dropped_update(&self) {
        self.updates_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            passes: self.passes.load(Ordering::Relaxed),
            aborted_passes: self.aborted_passes.load(Ordering::Relaxed),
            candidates: self.candidates.load(Ordering::Relaxed),
            opportunities: self.opportunities.load(Ordering::Relaxed),
            path_failures: self.path_failures.load(Ordering::Relaxed),
            updates_applied: self.updates_applied.load(Ordering::Relaxed),
            updates_stale: self.updates_stale.load(Ordering::Relaxed),
            updates_rejected: self.updates_rejected.load(Ordering::Relaxed),
            updates_dropped: self.updates_dropped.load(Ordering::Relaxed),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for DetectorMetrics {
    fn default() -> Self {
        Self::new()
    }
}
