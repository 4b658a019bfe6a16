//! Records file input and failed-record output (JSON lines).

use std::path::{Path, PathBuf};

use contracts::{FlowRecord, Record};
use dispatcher::DispatchReport;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{CliError, Result};

/// Read every record from a JSON-lines file
///
/// Blank lines are skipped; any other line must be a complete record.
pub async fn read_records(path: &Path) -> Result<Vec<FlowRecord>> {
    let content = tokio::fs::read_to_string(path).await?;
    parse_records(path, &content)
}

fn parse_records(path: &Path, content: &str) -> Result<Vec<FlowRecord>> {
    let mut records = Vec::new();

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str::<FlowRecord>(line)
            .map_err(|e| CliError::record_parse(path, index + 1, e.to_string()))?;
        records.push(record);
    }

    debug!(path = %path.display(), records = records.len(), "Records loaded");
    Ok(records)
}

/// One failed record as written to the failures file
#[derive(Debug, Serialize)]
struct FailureLine<'a> {
    /// Position in the records file (0-based, blank lines excluded)
    position: usize,
    record_id: &'a str,
    reason_kind: &'static str,
    reason: String,
    penalize: bool,
    record: &'a FlowRecord,
}

/// Appends failed records to a JSON-lines file
pub struct FailureWriter {
    path: PathBuf,
    file: tokio::fs::File,
    written: usize,
}

impl FailureWriter {
    /// Create (or truncate) the failures file
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = tokio::fs::File::create(&path).await?;
        Ok(Self {
            path,
            file,
            written: 0,
        })
    }

    /// Write every failure of a report; `offset` is the position of the
    /// report's first record in the whole input
    pub async fn write_report(
        &mut self,
        report: &DispatchReport<FlowRecord>,
        offset: usize,
    ) -> Result<usize> {
        let mut buf = Vec::new();
        let mut count = 0;

        for routed in report.failures() {
            let Some(reason) = routed.routing.failure_reason() else {
                continue;
            };
            let line = FailureLine {
                position: offset + routed.position,
                record_id: routed.record.record_id(),
                reason_kind: reason.kind(),
                reason: reason.to_string(),
                penalize: routed.routing.is_penalized(),
                record: &routed.record,
            };
            serde_json::to_writer(&mut buf, &line)
                .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
            buf.push(b'\n');
            count += 1;
        }

        if count > 0 {
            self.file.write_all(&buf).await?;
            self.written += count;
        }
        Ok(count)
    }

    /// Flush and close, returning the number of lines written
    pub async fn finish(mut self) -> Result<usize> {
        self.file.flush().await?;
        debug!(path = %self.path.display(), failures = self.written, "Failures file written");
        Ok(self.written)
    }
}
