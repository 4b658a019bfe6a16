//! FileClient - appends bulk writes to per-destination JSON-lines files

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use contracts::{Cell, ContractError, WriteClient, WriteRequest};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

/// Configuration for FileClient
#[derive(Debug, Clone)]
pub struct FileClientConfig {
    /// Base output directory
    pub base_path: PathBuf,
}

/// One stored row, bytes rendered as UTF-8 text
#[derive(Debug, Serialize)]
struct StoredRow<'a> {
    destination: &'a str,
    key: String,
    cells: Vec<StoredCell>,
    written_at: String,
}

#[derive(Debug, Serialize)]
struct StoredCell {
    family: String,
    qualifier: String,
    value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<i64>,
}

impl StoredCell {
    fn from_cell(cell: &Cell) -> Self {
        let text = |b: &Option<bytes::Bytes>| {
            b.as_deref()
                .map(|b| String::from_utf8_lossy(b).into_owned())
                .unwrap_or_default()
        };
        Self {
            family: text(&cell.family),
            qualifier: text(&cell.qualifier),
            value: text(&cell.value),
            timestamp: cell.timestamp,
        }
    }
}

/// Client that appends each destination's rows to `<base_path>/<destination>.jsonl`
///
/// A group is serialized completely before a single append, so either all of
/// it reaches the file or the put fails.
pub struct FileClient {
    name: String,
    config: FileClientConfig,
}

impl FileClient {
    /// Create a new FileClient
    pub fn new(name: impl Into<String>, config: FileClientConfig) -> std::io::Result<Self> {
        // Create base directory if it doesn't exist
        fs::create_dir_all(&config.base_path)?;

        Ok(Self {
            name: name.into(),
            config,
        })
    }

    /// Output file for a destination
    pub fn destination_path(&self, destination: &str) -> PathBuf {
        self.config.base_path.join(format!("{destination}.jsonl"))
    }

    pub fn base_path(&self) -> &Path {
        &self.config.base_path
    }

    fn check_destination(destination: &str) -> Result<(), ContractError> {
        if destination.is_empty()
            || destination.contains(['/', '\\'])
            || destination.contains("..")
        {
            return Err(ContractError::write_failed(
                destination,
                "destination is not a valid file name",
            ));
        }
        Ok(())
    }

    fn encode_group(destination: &str, requests: &[WriteRequest]) -> Result<Vec<u8>, ContractError> {
        let written_at = Utc::now().to_rfc3339();
        let mut buf = Vec::new();

        for request in requests {
            let row = StoredRow {
                destination,
                key: request.key_text(),
                cells: request.cells.iter().map(StoredCell::from_cell).collect(),
                written_at: written_at.clone(),
            };
            serde_json::to_writer(&mut buf, &row)
                .map_err(|e| ContractError::write_failed_with(destination, e))?;
            buf.push(b'\n');
        }

        Ok(buf)
    }
}

impl WriteClient for FileClient {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_client_put",
        skip(self, requests),
        fields(client = %self.name, destination = %destination, requests = requests.len())
    )]
    async fn put(&self, destination: &str, requests: &[WriteRequest]) -> Result<(), ContractError> {
        Self::check_destination(destination)?;
        let buf = Self::encode_group(destination, requests)?;
        let path = self.destination_path(destination);

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| ContractError::write_failed_with(destination, e))?;
        file.write_all(&buf)
            .await
            .map_err(|e| ContractError::write_failed_with(destination, e))?;
        file.flush()
            .await
            .map_err(|e| ContractError::write_failed_with(destination, e))?;

        debug!(path = %path.display(), bytes = buf.len(), "Group appended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn client(dir: &TempDir) -> FileClient {
        FileClient::new(
            "file",
            FileClientConfig {
                base_path: dir.path().join("out"),
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_file_client_appends_group() {
        let dir = TempDir::new().unwrap();
        let client = client(&dir);
        let requests = vec![
            WriteRequest::new("users", "u1", vec![Cell::new("cf", "name", "alice")]),
            WriteRequest::new(
                "users",
                "u2",
                vec![Cell::new("cf", "name", "bob").with_timestamp(7)],
            ),
        ];

        client.put("users", &requests).await.unwrap();
        client.put("users", &requests[..1]).await.unwrap();

        let content = std::fs::read_to_string(client.destination_path("users")).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["key"], "u1");
        assert_eq!(lines[0]["cells"][0]["value"], "alice");
        assert_eq!(lines[1]["cells"][0]["timestamp"], 7);
        assert!(lines[0]["written_at"].is_string());
    }

    #[tokio::test]
    async fn test_file_client_rejects_path_destination() {
        let dir = TempDir::new().unwrap();
        let client = client(&dir);
        let requests = vec![WriteRequest::new("x", "k", vec![Cell::new("cf", "q", "v")])];

        for destination in ["../escape", "a/b", ""] {
            let err = client.put(destination, &requests).await.unwrap_err();
            assert!(matches!(err, ContractError::WriteFailed { .. }));
        }
    }

    #[test]
    fn test_file_client_creates_base_dir() {
        let dir = TempDir::new().unwrap();
        let client = client(&dir);
        assert!(client.base_path().is_dir());
    }
}
