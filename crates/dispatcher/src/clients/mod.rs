//! WriteClient implementations
//!
//! Contains LogClient, FileClient, and MemoryClient.

mod file;
mod log;
mod memory;

pub use self::file::{FileClient, FileClientConfig};
pub use self::log::LogClient;
pub use self::memory::{MemoryClient, PutCall};

use std::path::PathBuf;

use contracts::{ClientConfig, ContractError, WriteClient, WriteRequest};
use tracing::instrument;

use crate::error::DispatcherError;

/// Any configured client
pub enum AnyClient {
    Log(LogClient),
    File(FileClient),
    Memory(MemoryClient),
}

impl WriteClient for AnyClient {
    fn name(&self) -> &str {
        match self {
            Self::Log(c) => c.name(),
            Self::File(c) => c.name(),
            Self::Memory(c) => c.name(),
        }
    }

    async fn put(&self, destination: &str, requests: &[WriteRequest]) -> Result<(), ContractError> {
        match self {
            Self::Log(c) => c.put(destination, requests).await,
            Self::File(c) => c.put(destination, requests).await,
            Self::Memory(c) => c.put(destination, requests).await,
        }
    }
}

/// Create a client from configuration
#[instrument(name = "dispatcher_create_client", skip(config), fields(kind = config.kind()))]
pub fn create_client(config: &ClientConfig) -> Result<AnyClient, DispatcherError> {
    match config {
        ClientConfig::Log => Ok(AnyClient::Log(LogClient::new("log"))),
        ClientConfig::File { base_path } => {
            let config = FileClientConfig {
                base_path: PathBuf::from(base_path),
            };
            let client = FileClient::new("file", config)
                .map_err(|e| DispatcherError::client_creation("file", e.to_string()))?;
            Ok(AnyClient::File(client))
        }
        ClientConfig::Memory { fail_destinations } => Ok(AnyClient::Memory(
            MemoryClient::failing(fail_destinations.iter().cloned()),
        )),
    }
}
