//! Dispatch 指标收集模块
//!
//! 基于 dispatcher 事件与 BatchSummary 收集和统计批量写入的运行指标。

use dispatcher::{BatchSummary, DispatchObserver, FailureReason, ProvenanceEvent};
use metrics::{counter, gauge, histogram};

/// 从 BatchSummary 记录指标
///
/// 每次 dispatch 结束时调用。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_batch_summary;
///
/// let report = dispatcher.dispatch(records, &builder, &client, &mut observer).await;
/// record_batch_summary(&report.summary());
/// ```
pub fn record_batch_summary(summary: &BatchSummary) {
    // 批次计数器
    counter!("batch_put_batches_total").increment(1);

    // 批次大小
    histogram!("batch_put_batch_records").record(summary.records as f64);
    gauge!("batch_put_last_batch_records").set(summary.records as f64);

    // 每批次的 put 次数 (分组数)
    histogram!("batch_put_batch_groups").record(summary.put_calls as f64);

    // 提交阶段耗时
    record_send_latency_ms(summary.send_duration.as_secs_f64() * 1000.0);
}

/// 记录单条记录的路由结果
pub fn record_record_routed(status: &str, reason: Option<&str>) {
    counter!(
        "batch_put_records_routed_total",
        "status" => status.to_string(),
        "reason" => reason.unwrap_or("none").to_string()
    )
    .increment(1);
}

/// 记录一次批量写入调用
pub fn record_put(destination: &str, requests: usize, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "batch_put_puts_total",
        "destination" => destination.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "batch_put_put_requests",
        "destination" => destination.to_string()
    )
    .record(requests as f64);
}

/// 记录写入的 cell 数
pub fn record_cells_written(destination: &str, cells: usize) {
    counter!(
        "batch_put_cells_written_total",
        "destination" => destination.to_string()
    )
    .increment(cells as u64);
}

/// 记录提交阶段耗时
pub fn record_send_latency_ms(latency_ms: f64) {
    histogram!("batch_put_send_latency_ms").record(latency_ms);
}

/// 把 dispatcher 事件转发到 `metrics` facade 的 observer
///
/// 未安装 recorder 时所有记录都是空操作。
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsObserver;

impl DispatchObserver for MetricsObserver {
    fn on_failure(&mut self, _record_id: &str, reason: &FailureReason, _penalize: bool) {
        record_record_routed("failure", Some(reason.kind()));
    }

    fn on_put(&mut self, destination: &str, requests: usize, ok: bool) {
        record_put(destination, requests, ok);
    }

    fn on_provenance(&mut self, _record_id: &str, event: &ProvenanceEvent) {
        record_record_routed("success", None);
        record_cells_written(&event.destination, event.cell_count);
    }

    fn on_batch(&mut self, summary: &BatchSummary) {
        record_batch_summary(summary);
    }
}

/// Dispatch 指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct DispatchStatsAggregator {
    /// 批次总数
    pub total_batches: u64,

    /// 记录总数
    pub total_records: u64,

    /// 成功记录数
    pub succeeded: u64,

    /// 构造失败记录数
    pub construction_failed: u64,

    /// 非法请求记录数
    pub invalid: u64,

    /// 写入失败记录数
    pub write_failed: u64,

    /// put 调用总数
    pub put_calls: u64,

    /// 提交阶段耗时统计 (毫秒)
    pub send_stats: RunningStats,

    /// 批次大小统计
    pub batch_size_stats: RunningStats,
}

impl DispatchStatsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, summary: &BatchSummary) {
        self.total_batches += 1;
        self.total_records += summary.records as u64;
        self.succeeded += summary.succeeded as u64;
        self.construction_failed += summary.construction_failed as u64;
        self.invalid += summary.invalid as u64;
        self.write_failed += summary.write_failed as u64;
        self.put_calls += summary.put_calls as u64;

        self.send_stats
            .push(summary.send_duration.as_secs_f64() * 1000.0);
        self.batch_size_stats.push(summary.records as f64);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let failed = self.construction_failed + self.invalid + self.write_failed;
        MetricsSummary {
            total_batches: self.total_batches,
            total_records: self.total_records,
            succeeded: self.succeeded,
            construction_failed: self.construction_failed,
            invalid: self.invalid,
            write_failed: self.write_failed,
            put_calls: self.put_calls,
            failure_rate: if self.total_records > 0 {
                failed as f64 / self.total_records as f64 * 100.0
            } else {
                0.0
            },
            send_latency_ms: StatsSummary::from(&self.send_stats),
            batch_size: StatsSummary::from(&self.batch_size_stats),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_batches: u64,
    pub total_records: u64,
    pub succeeded: u64,
    pub construction_failed: u64,
    pub invalid: u64,
    pub write_failed: u64,
    pub put_calls: u64,
    pub failure_rate: f64,
    pub send_latency_ms: StatsSummary,
    pub batch_size: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Metrics Summary ===")?;
        writeln!(f, "Batches: {}", self.total_batches)?;
        writeln!(f, "Records: {}", self.total_records)?;
        writeln!(f, "Succeeded: {}", self.succeeded)?;
        writeln!(
            f,
            "Failed: {} ({:.2}%)",
            self.construction_failed + self.invalid + self.write_failed,
            self.failure_rate
        )?;
        writeln!(f, "  construction failed: {}", self.construction_failed)?;
        writeln!(f, "  invalid request: {}", self.invalid)?;
        writeln!(f, "  write failed: {}", self.write_failed)?;
        writeln!(f, "Put calls: {}", self.put_calls)?;
        writeln!(f, "Send latency (ms): {}", self.send_latency_ms)?;
        writeln!(f, "Batch size: {}", self.batch_size)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}
