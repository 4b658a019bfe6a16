//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 分组 / 全有或全无 / 校验顺序等性质测试
//! - 配置 -> builder -> client 的端到端测试

#[cfg(test)]
mod support {
    use contracts::{Cell, ContractError, FlowRecord, RequestBuilder, WriteRequest};

    /// Builder driven entirely by record attributes
    ///
    /// - `table` / `row`: destination and key (absent -> blank / null)
    /// - `cells`: number of cells (default 1)
    /// - `fail`: builder returns an error
    pub struct ScriptedBuilder;

    impl RequestBuilder<FlowRecord> for ScriptedBuilder {
        fn name(&self) -> &str {
            "scripted"
        }

        fn build(&self, record: &FlowRecord) -> Result<WriteRequest, ContractError> {
            if record.attribute("fail").is_some() {
                return Err(ContractError::request_build(&record.id, "scripted failure"));
            }

            let cells = record
                .attribute("cells")
                .and_then(|n| n.parse::<usize>().ok())
                .unwrap_or(1);

            Ok(WriteRequest {
                destination: record.attribute("table").unwrap_or_default().to_string(),
                key: record
                    .attribute("row")
                    .map(|row| row.to_string().into_bytes().into()),
                cells: (0..cells)
                    .map(|i| Cell::new("cf", format!("q{i}"), record.content.clone()))
                    .collect(),
            })
        }
    }

    pub fn record(id: &str, table: &str, row: &str) -> FlowRecord {
        FlowRecord::new(id, format!("value-{id}"))
            .with_attribute("table", table)
            .with_attribute("row", row)
    }
}

#[cfg(test)]
mod contract_tests {
    use contracts::{Cell, MissingField, WriteRequest};

    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_failure_reason_texts() {
        assert_eq!(MissingField::Destination.reason(), "missing destination");
        assert_eq!(MissingField::Key.reason(), "missing key");
        assert_eq!(MissingField::Cells.reason(), "no columns provided");
    }

    #[test]
    fn test_transit_uri_shape() {
        let request = WriteRequest::new("users", "u1", vec![Cell::new("cf", "q", "v")]);
        assert_eq!(request.transit_uri("hbase"), "hbase://users/u1");
    }
}

#[cfg(test)]
mod e2e_tests {
    use contracts::{FlowRecord, MissingField};
    use dispatcher::{BatchDispatcher, FailureReason, MemoryClient, NoopObserver, PutCall};

    use crate::support::{record, ScriptedBuilder};

    /// Scenario: three valid records for one destination
    #[tokio::test]
    async fn test_single_destination_all_success() {
        let client = MemoryClient::new();
        let records = vec![
            record("1", "T1", "a"),
            record("2", "T1", "b"),
            record("3", "T1", "c"),
        ];

        let report = BatchDispatcher::default()
            .dispatch(records, &ScriptedBuilder, &client, &mut NoopObserver)
            .await;

        assert_eq!(report.successes().count(), 3);
        assert_eq!(report.failures().count(), 0);
        assert_eq!(
            client.calls(),
            vec![PutCall {
                destination: "T1".into(),
                requests: 3,
                ok: true
            }]
        );
    }

    /// Scenario: one destination fails, the other succeeds
    #[tokio::test]
    async fn test_failed_destination_does_not_affect_other() {
        let client = MemoryClient::failing(["T1"]);
        let records = vec![record("1", "T1", "a"), record("2", "T2", "b")];

        let report = BatchDispatcher::default()
            .dispatch(records, &ScriptedBuilder, &client, &mut NoopObserver)
            .await;

        let first = report.routing_at(0).unwrap();
        assert!(!first.is_success());
        assert!(first.is_penalized());
        assert!(matches!(
            first.failure_reason(),
            Some(FailureReason::WriteFailed { destination, .. }) if destination == "T1"
        ));

        let second = report.routing_at(1).unwrap();
        assert!(second.is_success());
        assert_eq!(client.rows("T2").len(), 1);
        assert_eq!(client.calls().len(), 2);
    }

    /// Scenario: empty cell list is rejected before any put
    #[tokio::test]
    async fn test_empty_cells_never_sent() {
        let client = MemoryClient::new();
        let records = vec![record("1", "T1", "a").with_attribute("cells", "0")];

        let report = BatchDispatcher::default()
            .dispatch(records, &ScriptedBuilder, &client, &mut NoopObserver)
            .await;

        let routing = report.routing_at(0).unwrap();
        assert_eq!(
            routing.failure_reason().map(ToString::to_string).as_deref(),
            Some("no columns provided")
        );
        assert!(!routing.is_penalized());
        assert!(client.calls().is_empty());
    }

    /// Scenario: empty batch
    #[tokio::test]
    async fn test_empty_batch() {
        let client = MemoryClient::new();
        let report = BatchDispatcher::default()
            .dispatch(Vec::<FlowRecord>::new(), &ScriptedBuilder, &client, &mut NoopObserver)
            .await;

        assert!(report.is_empty());
        assert_eq!(report.put_calls(), 0);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_blank_destination_wins_over_missing_key() {
        let client = MemoryClient::new();
        let records = vec![FlowRecord::new("1", "v").with_attribute("table", "  ")];

        let report = BatchDispatcher::default()
            .dispatch(records, &ScriptedBuilder, &client, &mut NoopObserver)
            .await;

        assert!(matches!(
            report.routing_at(0).and_then(|r| r.failure_reason()),
            Some(FailureReason::InvalidRequest(MissingField::Destination))
        ));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_construction_failure_is_isolated() {
        let client = MemoryClient::new();
        let records = vec![
            record("1", "T1", "a"),
            record("2", "T1", "b").with_attribute("fail", "yes"),
            record("3", "T1", "c"),
        ];

        let report = BatchDispatcher::default()
            .dispatch(records, &ScriptedBuilder, &client, &mut NoopObserver)
            .await;

        assert!(matches!(
            report.routing_at(1).and_then(|r| r.failure_reason()),
            Some(FailureReason::ConstructionFailed { .. })
        ));
        assert!(report.routing_at(0).unwrap().is_success());
        assert!(report.routing_at(2).unwrap().is_success());

        let keys: Vec<String> = client.rows("T1").iter().map(|r| r.key_text()).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_grouping_preserves_first_seen_order() {
        let client = MemoryClient::new();
        let records = vec![
            record("1", "T2", "x"),
            record("2", "T1", "a"),
            record("3", "T2", "y"),
            record("4", "T1", "b"),
            record("5", "T3", "z"),
        ];

        BatchDispatcher::default()
            .dispatch(records, &ScriptedBuilder, &client, &mut NoopObserver)
            .await;

        let destinations: Vec<String> = client
            .calls()
            .into_iter()
            .map(|c| c.destination)
            .collect();
        assert_eq!(destinations, vec!["T2", "T1", "T3"]);

        let t2: Vec<String> = client.rows("T2").iter().map(|r| r.key_text()).collect();
        assert_eq!(t2, vec!["x", "y"]);
    }

    #[tokio::test]
    async fn test_all_or_nothing_per_group() {
        let client = MemoryClient::failing(["T1"]);
        let records = vec![
            record("1", "T1", "a"),
            record("2", "T2", "b"),
            record("3", "T1", "c"),
            record("4", "T2", "d"),
        ];

        let report = BatchDispatcher::default()
            .dispatch(records, &ScriptedBuilder, &client, &mut NoopObserver)
            .await;

        for routed in report.routed() {
            let destination = routed.record.attribute("table").unwrap();
            assert_eq!(routed.routing.is_success(), destination == "T2");
        }
    }

    #[tokio::test]
    async fn test_dispatch_is_idempotent() {
        let records = vec![
            record("1", "T1", "a"),
            FlowRecord::new("2", "v").with_attribute("table", "T1"),
            record("3", "T2", "b").with_attribute("fail", "yes"),
            record("4", "T3", "c"),
        ];
        let batch_dispatcher = BatchDispatcher::default();

        let decisions = |report: &dispatcher::DispatchReport<FlowRecord>| {
            let mut decisions: Vec<(usize, bool, Option<&'static str>)> = report
                .routed()
                .iter()
                .map(|r| {
                    (
                        r.position,
                        r.routing.is_success(),
                        r.routing.failure_reason().map(FailureReason::kind),
                    )
                })
                .collect();
            decisions.sort();
            decisions
        };

        let client = MemoryClient::failing(["T3"]);
        let first = batch_dispatcher
            .dispatch(records.clone(), &ScriptedBuilder, &client, &mut NoopObserver)
            .await;
        let second = batch_dispatcher
            .dispatch(records, &ScriptedBuilder, &client, &mut NoopObserver)
            .await;

        assert_eq!(decisions(&first), decisions(&second));
    }

    #[tokio::test]
    async fn test_shared_send_duration_and_details() {
        let client = MemoryClient::new();
        let records = vec![
            record("1", "T1", "a").with_attribute("cells", "3"),
            record("2", "T2", "b"),
        ];

        let report = BatchDispatcher::new("bigtable")
            .dispatch(records, &ScriptedBuilder, &client, &mut NoopObserver)
            .await;

        let events: Vec<_> = report
            .successes()
            .filter_map(|r| r.routing.provenance())
            .collect();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.duration == report.send_duration()));

        let first = events.iter().find(|e| e.destination == "T1").unwrap();
        assert_eq!(first.transit_uri, "bigtable://T1/a");
        assert_eq!(first.details, "Put 3 cells to bigtable");
    }
}

#[cfg(test)]
mod pipeline_tests {
    use std::sync::Arc;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::FlowRecord;
    use dispatcher::{BatchDispatcher, DispatchMetrics};
    use observability::{DispatchStatsAggregator, MetricsObserver};

    const CELL_CONFIG: &str = r#"
[dispatcher]
scheme = "hbase"
batch_size = 2

[builder]
kind = "cell"
destination = "${table}"
key = "${row}"
family = "cf"
qualifier = "${column}"
timestamp = "${ts}"
"#;

    fn cell_record(id: &str, table: &str, row: &str, ts: &str) -> FlowRecord {
        FlowRecord::new(id, format!("value-{id}"))
            .with_attribute("table", table)
            .with_attribute("row", row)
            .with_attribute("column", "name")
            .with_attribute("ts", ts)
    }

    /// 配置 -> builder -> file client -> 磁盘
    #[tokio::test]
    async fn test_config_to_file_client_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = format!(
            "{CELL_CONFIG}\n[client]\nkind = \"file\"\nbase_path = \"{}\"\n",
            dir.path().join("rows").display()
        );
        let blueprint = ConfigLoader::load_from_str(&config, ConfigFormat::Toml).unwrap();

        let builder = request_builder::from_config(&blueprint.builder).unwrap();
        let client = dispatcher::create_client(&blueprint.client).unwrap();
        let batch_dispatcher = BatchDispatcher::from_settings(&blueprint.dispatcher);

        let records = vec![
            cell_record("1", "users", "u1", "100"),
            cell_record("2", "users", "u2", "not-a-number"),
            cell_record("3", "audit", "a1", "300"),
        ];

        let metrics = Arc::new(DispatchMetrics::new());
        let mut observer = (MetricsObserver, Arc::clone(&metrics));
        let report = batch_dispatcher
            .dispatch(records, builder.as_ref(), &client, &mut observer)
            .await;

        let summary = report.summary();
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.construction_failed, 1);
        assert_eq!(summary.put_calls, 2);
        assert_eq!(metrics.snapshot().cell_count, 2);

        let users = std::fs::read_to_string(dir.path().join("rows/users.jsonl")).unwrap();
        let row: serde_json::Value = serde_json::from_str(users.trim()).unwrap();
        assert_eq!(row["key"], "u1");
        assert_eq!(row["cells"][0]["qualifier"], "name");
        assert_eq!(row["cells"][0]["value"], "value-1");
        assert_eq!(row["cells"][0]["timestamp"], 100);
    }

    #[tokio::test]
    async fn test_json_builder_with_memory_client() {
        let config = r#"
[builder]
kind = "json"
destination = "events"
key_field = "id"
family = "cf"
complex_fields = "ignore"

[client]
kind = "memory"
"#;
        let blueprint = ConfigLoader::load_from_str(config, ConfigFormat::Toml).unwrap();
        let builder = request_builder::from_config(&blueprint.builder).unwrap();
        let client = dispatcher::create_client(&blueprint.client).unwrap();

        let records = vec![
            FlowRecord::new("1", r#"{"id":"e1","kind":"click","tags":["a"]}"#),
            FlowRecord::new("2", r#"[1,2,3]"#),
            FlowRecord::new("3", r#"{"id":"e3","count":7}"#),
        ];

        let report = BatchDispatcher::from_settings(&blueprint.dispatcher)
            .dispatch(records, builder.as_ref(), &client, &mut dispatcher::NoopObserver)
            .await;

        let summary = report.summary();
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.construction_failed, 1);
        assert_eq!(summary.put_calls, 1);

        let dispatcher::AnyClient::Memory(memory) = &client else {
            panic!("expected memory client");
        };
        let rows = memory.rows("events");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key_text(), "e1");
        // tags ignored, id removed from the cell set
        assert_eq!(rows[0].cells.len(), 1);
    }

    #[tokio::test]
    async fn test_batches_aggregate_into_stats() {
        let blueprint = ConfigLoader::load_from_str(
            &format!("{CELL_CONFIG}\n[client]\nkind = \"memory\"\nfail_destinations = [\"audit\"]\n"),
            ConfigFormat::Toml,
        )
        .unwrap();
        let builder = request_builder::from_config(&blueprint.builder).unwrap();
        let client = dispatcher::create_client(&blueprint.client).unwrap();
        let batch_dispatcher = BatchDispatcher::from_settings(&blueprint.dispatcher);

        let records = vec![
            cell_record("1", "users", "u1", "1"),
            cell_record("2", "audit", "a1", "2"),
            cell_record("3", "users", "u2", "3"),
        ];

        let mut aggregator = DispatchStatsAggregator::new();
        let mut remaining = records.into_iter();
        loop {
            let batch: Vec<_> = remaining
                .by_ref()
                .take(blueprint.dispatcher.batch_size)
                .collect();
            if batch.is_empty() {
                break;
            }
            let report = batch_dispatcher
                .dispatch(batch, builder.as_ref(), &client, &mut MetricsObserver)
                .await;
            aggregator.update(&report.summary());
        }

        let summary = aggregator.summary();
        assert_eq!(summary.total_batches, 2);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.write_failed, 1);
        assert_eq!(summary.put_calls, 3);
    }
}
