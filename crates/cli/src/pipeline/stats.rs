//! Pipeline statistics and metrics.

use std::time::Duration;

use dispatcher::MetricsSnapshot;
use observability::DispatchStatsAggregator;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Records read from the input file
    pub records_read: usize,

    /// Failed records written to the failures file
    pub failures_written: usize,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Per-batch dispatch aggregates
    pub dispatch: DispatchStatsAggregator,

    /// Counters collected by the dispatch observer
    pub metrics: MetricsSnapshot,

    /// Stopped by a shutdown request before all records were dispatched
    pub interrupted: bool,
}

impl PipelineStats {
    /// Records dispatched per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.dispatch.total_records as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Whether any record was routed to failure
    pub fn has_failures(&self) -> bool {
        self.dispatch.construction_failed + self.dispatch.invalid + self.dispatch.write_failed > 0
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Pipeline Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Records read: {}", self.records_read);
        println!("   ├─ Batches: {}", self.dispatch.total_batches);
        println!("   ├─ Records/s: {:.2}", self.throughput());
        println!("   ├─ Failures written: {}", self.failures_written);
        if self.interrupted {
            println!(
                "   └─ Interrupted: {} records not dispatched",
                (self.records_read as u64).saturating_sub(self.dispatch.total_records)
            );
        } else {
            println!("   └─ Interrupted: no");
        }

        let summary = self.dispatch.summary();

        println!("\n📈 Routing");
        println!("   ├─ Succeeded: {}", summary.succeeded);
        println!(
            "   ├─ Construction failed: {}",
            summary.construction_failed
        );
        println!("   ├─ Invalid request: {}", summary.invalid);
        println!("   ├─ Write failed: {}", summary.write_failed);
        println!("   └─ Failure rate: {:.2}%", summary.failure_rate);

        println!("\n📤 Bulk Puts");
        println!(
            "   ├─ Calls: {} ({} failed)",
            self.metrics.put_count, self.metrics.put_failure_count
        );
        println!("   ├─ Cells written: {}", self.metrics.cell_count);
        println!("   ├─ Send latency (ms): {}", summary.send_latency_ms);
        println!("   └─ Batch size: {}", summary.batch_size);

        println!();
    }
}
