//! Dispatch metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::observer::DispatchObserver;
use crate::report::{BatchSummary, FailureReason, ProvenanceEvent};

/// Counters accumulated across dispatch passes
///
/// Lock-free so one instance can be shared (`Arc`) with a reporter while a
/// pipeline drives it as an observer.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Total dispatch passes
    batch_count: AtomicU64,
    /// Records routed to success
    success_count: AtomicU64,
    /// Records whose request could not be built
    construction_failure_count: AtomicU64,
    /// Records with a structurally invalid request
    invalid_count: AtomicU64,
    /// Records failed by a bulk write error
    write_failure_count: AtomicU64,
    /// Bulk write calls issued
    put_count: AtomicU64,
    /// Bulk write calls that failed
    put_failure_count: AtomicU64,
    /// Cells written successfully
    cell_count: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch_count(&self) -> u64 {
        self.batch_count.load(Ordering::Relaxed)
    }

    pub fn success_count(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.construction_failure_count.load(Ordering::Relaxed)
            + self.invalid_count.load(Ordering::Relaxed)
            + self.write_failure_count.load(Ordering::Relaxed)
    }

    pub fn put_count(&self) -> u64 {
        self.put_count.load(Ordering::Relaxed)
    }

    /// Record one routing failure
    pub fn record_failure(&self, reason: &FailureReason) {
        let counter = match reason {
            FailureReason::ConstructionFailed { .. } => &self.construction_failure_count,
            FailureReason::InvalidRequest(_) => &self.invalid_count,
            FailureReason::WriteFailed { .. } => &self.write_failure_count,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one bulk write call
    pub fn record_put(&self, ok: bool) {
        self.put_count.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.put_failure_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record one successful record write
    pub fn record_success(&self, cells: usize) {
        self.success_count.fetch_add(1, Ordering::Relaxed);
        self.cell_count.fetch_add(cells as u64, Ordering::Relaxed);
    }

    /// Record end of a dispatch pass
    pub fn record_batch(&self) {
        self.batch_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batch_count: self.batch_count(),
            success_count: self.success_count(),
            construction_failure_count: self.construction_failure_count.load(Ordering::Relaxed),
            invalid_count: self.invalid_count.load(Ordering::Relaxed),
            write_failure_count: self.write_failure_count.load(Ordering::Relaxed),
            put_count: self.put_count(),
            put_failure_count: self.put_failure_count.load(Ordering::Relaxed),
            cell_count: self.cell_count.load(Ordering::Relaxed),
        }
    }
}

impl DispatchObserver for Arc<DispatchMetrics> {
    fn on_failure(&mut self, _record_id: &str, reason: &FailureReason, _penalize: bool) {
        self.record_failure(reason);
    }

    fn on_put(&mut self, _destination: &str, _requests: usize, ok: bool) {
        self.record_put(ok);
    }

    fn on_provenance(&mut self, _record_id: &str, event: &ProvenanceEvent) {
        self.record_success(event.cell_count);
    }

    fn on_batch(&mut self, _summary: &BatchSummary) {
        self.record_batch();
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batch_count: u64,
    pub success_count: u64,
    pub construction_failure_count: u64,
    pub invalid_count: u64,
    pub write_failure_count: u64,
    pub put_count: u64,
    pub put_failure_count: u64,
    pub cell_count: u64,
}
