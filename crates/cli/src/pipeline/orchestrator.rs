//! Pipeline orchestrator - reads records, dispatches them batch by batch and
//! collects statistics.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{FlowRecord, PutBlueprint, RequestBuilder, WriteClient};
use dispatcher::{BatchDispatcher, DispatchMetrics};
use observability::MetricsObserver;
use tokio::sync::watch;
use tracing::{info, warn};

use super::records::{read_records, FailureWriter};
use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The validated put blueprint
    pub blueprint: PutBlueprint,

    /// JSON-lines records file
    pub records_path: PathBuf,

    /// Failed records output (None = not written)
    pub failures_out: Option<PathBuf>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline until every record is dispatched or `shutdown`
    /// turns true.
    ///
    /// 停止信号只在批次之间检查：已经发出的 put 会等到结果返回，
    /// 该批次的失败记录照常写入，failures 文件在返回前刷新。
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::install_metrics_exporter(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Setup builder and client
        let builder = request_builder::from_config(&blueprint.builder)
            .context("Failed to create request builder")?;
        let client = dispatcher::create_client(&blueprint.client)
            .context("Failed to create write client")?;

        info!(
            builder = blueprint.builder.kind(),
            client = blueprint.client.kind(),
            scheme = %blueprint.dispatcher.scheme,
            batch_size = blueprint.dispatcher.batch_size,
            "Dispatcher configured"
        );

        // Load records
        let records = read_records(&self.config.records_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to read records from {}",
                    self.config.records_path.display()
                )
            })?;

        if records.is_empty() {
            warn!(path = %self.config.records_path.display(), "Records file is empty");
        }

        let mut failures = match &self.config.failures_out {
            Some(path) => Some(
                FailureWriter::create(path)
                    .await
                    .with_context(|| format!("Failed to create {}", path.display()))?,
            ),
            None => None,
        };

        let mut stats = PipelineStats {
            records_read: records.len(),
            ..Default::default()
        };

        let outcome = self
            .dispatch_records(
                records,
                builder.as_ref(),
                &client,
                failures.as_mut(),
                &shutdown,
                &mut stats,
            )
            .await;

        // flush what was written so far, even when the loop stopped early
        if let Some(writer) = failures {
            stats.failures_written = writer.finish().await?;
        }
        outcome?;

        stats.duration = start_time.elapsed();

        if stats.interrupted {
            warn!(
                dispatched = stats.dispatch.total_records,
                skipped = (stats.records_read as u64)
                    .saturating_sub(stats.dispatch.total_records),
                "Pipeline interrupted between batches"
            );
        }
        info!(
            duration_secs = stats.duration.as_secs_f64(),
            records_per_sec = format!("{:.2}", stats.throughput()),
            "Pipeline complete"
        );

        Ok(stats)
    }

    /// Dispatch `records` in chunks of `batch_size`
    async fn dispatch_records<B, C>(
        &self,
        records: Vec<FlowRecord>,
        builder: &B,
        client: &C,
        mut failures: Option<&mut FailureWriter>,
        shutdown: &watch::Receiver<bool>,
        stats: &mut PipelineStats,
    ) -> Result<()>
    where
        B: RequestBuilder<FlowRecord> + ?Sized,
        C: WriteClient + Sync,
    {
        let settings = &self.config.blueprint.dispatcher;
        let batch_dispatcher = BatchDispatcher::from_settings(settings);
        let metrics = Arc::new(DispatchMetrics::new());
        let mut observer = (MetricsObserver, Arc::clone(&metrics));

        // batch_size > 0 is guaranteed by validation
        let batch_size = settings.batch_size.max(1);
        let mut remaining = records.into_iter();
        let mut offset = 0usize;

        loop {
            let batch: Vec<_> = remaining.by_ref().take(batch_size).collect();
            if batch.is_empty() {
                break;
            }
            if *shutdown.borrow() {
                stats.interrupted = true;
                break;
            }
            let batch_len = batch.len();

            let report = batch_dispatcher
                .dispatch(batch, builder, client, &mut observer)
                .await;
            let summary = report.summary();
            stats.dispatch.update(&summary);

            info!(
                batch = stats.dispatch.total_batches,
                records = summary.records,
                succeeded = summary.succeeded,
                failed = summary.failed(),
                puts = summary.put_calls,
                send_ms = summary.send_duration.as_millis() as u64,
                "Batch dispatched"
            );

            if let Some(writer) = failures.as_deref_mut() {
                writer
                    .write_report(&report, offset)
                    .await
                    .context("Failed to write failed records")?;
            }
            offset += batch_len;
        }

        stats.metrics = metrics.snapshot();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        BuilderConfig, CellBuilderConfig, ClientConfig, ConfigVersion, ContractError,
        DispatcherSettings, WriteRequest,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Raises the stop flag from inside `put`, then takes a while to answer
    struct SignallingClient {
        shutdown: watch::Sender<bool>,
        puts: AtomicUsize,
    }

    impl WriteClient for SignallingClient {
        fn name(&self) -> &str {
            "signalling"
        }

        async fn put(
            &self,
            _destination: &str,
            _requests: &[WriteRequest],
        ) -> std::result::Result<(), ContractError> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.shutdown.send_replace(true);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(())
        }
    }

    fn keep_running() -> watch::Receiver<bool> {
        watch::channel(false).1
    }

    fn positions(path: &std::path::Path) -> Vec<u64> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["position"].as_u64().unwrap())
            .collect()
    }

    fn blueprint(batch_size: usize, client: ClientConfig) -> PutBlueprint {
        PutBlueprint {
            version: ConfigVersion::V1,
            dispatcher: DispatcherSettings {
                scheme: "hbase".into(),
                batch_size,
            },
            builder: BuilderConfig::Cell(CellBuilderConfig {
                destination: "${table}".into(),
                key: "${row}".into(),
                family: "cf".into(),
                qualifier: "q".into(),
                timestamp: None,
            }),
            client,
        }
    }

    fn write_records(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("records.jsonl");
        let lines = [
            r#"{"id":"1","attributes":{"table":"users","row":"u1"},"content":"alice"}"#,
            r#"{"id":"2","attributes":{"table":"users"},"content":"bob"}"#,
            r#"{"id":"3","attributes":{"table":"audit","row":"a1"},"content":"login"}"#,
            r#"{"id":"4","attributes":{"table":"users","row":"u2"},"content":"carol"}"#,
            r#"{"id":"5","attributes":{"table":"audit","row":"a2"},"content":"logout"}"#,
        ];
        std::fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    #[tokio::test]
    async fn test_pipeline_dispatches_in_batches() {
        let dir = TempDir::new().unwrap();
        let records_path = write_records(&dir);
        let failures_out = dir.path().join("failures.jsonl");

        let pipeline = Pipeline::new(PipelineConfig {
            blueprint: blueprint(
                2,
                ClientConfig::Memory {
                    fail_destinations: vec!["audit".into()],
                },
            ),
            records_path,
            failures_out: Some(failures_out.clone()),
            metrics_port: None,
        });

        let stats = pipeline.run(keep_running()).await.unwrap();

        assert_eq!(stats.records_read, 5);
        assert_eq!(stats.dispatch.total_batches, 3);
        assert_eq!(stats.dispatch.succeeded, 2);
        assert_eq!(stats.dispatch.invalid, 1);
        assert_eq!(stats.dispatch.write_failed, 2);
        assert_eq!(stats.failures_written, 3);
        assert_eq!(stats.metrics.success_count, 2);
        assert!(!stats.interrupted);
        assert_eq!(positions(&failures_out), vec![1, 2, 4]);
    }

    #[tokio::test]
    async fn test_stop_requested_before_start_dispatches_nothing() {
        let dir = TempDir::new().unwrap();
        let records_path = write_records(&dir);
        let failures_out = dir.path().join("failures.jsonl");

        let pipeline = Pipeline::new(PipelineConfig {
            blueprint: blueprint(2, ClientConfig::Memory { fail_destinations: vec![] }),
            records_path,
            failures_out: Some(failures_out.clone()),
            metrics_port: None,
        });

        let (_tx, rx) = watch::channel(true);
        let stats = pipeline.run(rx).await.unwrap();

        assert!(stats.interrupted);
        assert_eq!(stats.records_read, 5);
        assert_eq!(stats.dispatch.total_batches, 0);
        assert_eq!(stats.failures_written, 0);
        assert!(positions(&failures_out).is_empty());
    }

    #[tokio::test]
    async fn test_in_flight_batch_completes_after_stop_request() {
        let dir = TempDir::new().unwrap();
        let records_path = write_records(&dir);
        let failures_out = dir.path().join("failures.jsonl");
        let records = read_records(&records_path).await.unwrap();

        let pipeline = Pipeline::new(PipelineConfig {
            blueprint: blueprint(2, ClientConfig::Log),
            records_path,
            failures_out: Some(failures_out.clone()),
            metrics_port: None,
        });
        let builder = request_builder::from_config(&pipeline.config.blueprint.builder).unwrap();

        let (tx, rx) = watch::channel(false);
        let client = SignallingClient {
            shutdown: tx,
            puts: AtomicUsize::new(0),
        };
        let mut writer = FailureWriter::create(failures_out.clone()).await.unwrap();
        let mut stats = PipelineStats::default();

        pipeline
            .dispatch_records(
                records,
                builder.as_ref(),
                &client,
                Some(&mut writer),
                &rx,
                &mut stats,
            )
            .await
            .unwrap();
        let written = writer.finish().await.unwrap();

        // first batch: "1" written once the slow put returns, "2" lacks a row key
        assert!(stats.interrupted);
        assert_eq!(client.puts.load(Ordering::SeqCst), 1);
        assert_eq!(stats.dispatch.total_batches, 1);
        assert_eq!(stats.dispatch.total_records, 2);
        assert_eq!(stats.dispatch.succeeded, 1);
        assert_eq!(stats.metrics.success_count, 1);
        assert_eq!(written, 1);
        assert_eq!(positions(&failures_out), vec![1]);
    }

    #[tokio::test]
    async fn test_pipeline_file_client_writes_rows() {
        let dir = TempDir::new().unwrap();
        let records_path = write_records(&dir);
        let base_path = dir.path().join("rows");

        let pipeline = Pipeline::new(PipelineConfig {
            blueprint: blueprint(
                25,
                ClientConfig::File {
                    base_path: base_path.display().to_string(),
                },
            ),
            records_path,
            failures_out: None,
            metrics_port: None,
        });

        let stats = pipeline.run(keep_running()).await.unwrap();
        assert_eq!(stats.dispatch.succeeded, 4);
        assert_eq!(stats.dispatch.put_calls, 2);

        let users = std::fs::read_to_string(base_path.join("users.jsonl")).unwrap();
        assert_eq!(users.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_pipeline_missing_records_file() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(PipelineConfig {
            blueprint: blueprint(25, ClientConfig::Log),
            records_path: dir.path().join("missing.jsonl"),
            failures_out: None,
            metrics_port: None,
        });

        let err = pipeline.run(keep_running()).await.unwrap_err();
        assert!(err.to_string().contains("Failed to read records"));
    }
}
