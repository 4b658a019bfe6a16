//! # Observability
//!
//! 可观测性模块：Tracing + Prometheus 指标。
//!
//! ## 功能
//!
//! - Tracing 初始化 (JSON/Pretty/Compact 格式)
//! - Prometheus 指标导出
//! - Dispatch 指标收集与统计
//!
//! ## 使用示例
//!
//! ```ignore
//! use observability::{init_tracing, install_metrics_exporter, LogConfig, MetricsObserver};
//!
//! init_tracing(&LogConfig::default())?;
//! install_metrics_exporter(9000)?;
//!
//! // 把 dispatch 事件转发到 Prometheus
//! let mut observer = MetricsObserver;
//! let report = dispatcher.dispatch(records, &builder, &client, &mut observer).await;
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Re-exports
pub use crate::metrics::{
    record_batch_summary, record_cells_written, record_put, record_record_routed,
    record_send_latency_ms, DispatchStatsAggregator, MetricsObserver, MetricsSummary,
    RunningStats, StatsSummary,
};

/// 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志格式
    pub format: LogFormat,
    /// 默认日志级别 (RUST_LOG 未设置时使用)
    pub default_level: String,
    /// 为 true 时忽略 RUST_LOG，强制使用 `default_level`
    pub force_level: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            default_level: "info".to_string(),
            force_level: false,
        }
    }
}

impl LogConfig {
    /// 根据 verbosity 计数 (-v / -vv) 与 quiet 标志构造
    pub fn from_verbosity(format: LogFormat, verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Self {
                format,
                default_level: "warn".to_string(),
                force_level: true,
            };
        }

        let level = match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        Self {
            format,
            default_level: level.to_string(),
            force_level: false,
        }
    }

    fn filter(&self) -> EnvFilter {
        if self.force_level {
            EnvFilter::new(&self.default_level)
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_level))
        }
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON 结构化日志
    #[default]
    Json,
    /// 人类可读格式
    Pretty,
    /// 紧凑单行格式
    Compact,
}

/// 初始化全局 tracing subscriber
///
/// 只能调用一次；重复调用返回错误。
pub fn init_tracing(config: &LogConfig) -> Result<()> {
    let fmt_layer = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(config.filter())
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::debug!(
        log_format = ?config.format,
        level = %config.default_level,
        "Tracing initialized"
    );
    Ok(())
}

/// 安装 Prometheus recorder 并监听 0.0.0.0:`port`
///
/// 安装之后 [`MetricsObserver`] 记录的指标才会被导出。
pub fn install_metrics_exporter(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}
