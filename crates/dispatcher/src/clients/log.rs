//! LogClient - logs bulk write summaries via tracing

use contracts::{ContractError, WriteClient, WriteRequest};
use tracing::{info, instrument};

/// Client that logs each bulk write instead of storing it
pub struct LogClient {
    name: String,
}

impl LogClient {
    /// Create a new LogClient with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl WriteClient for LogClient {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_client_put",
        skip(self, requests),
        fields(client = %self.name, destination = %destination)
    )]
    async fn put(&self, destination: &str, requests: &[WriteRequest]) -> Result<(), ContractError> {
        let cells: usize = requests.iter().map(|r| r.cells.len()).sum();

        info!(
            client = %self.name,
            destination = %destination,
            requests = requests.len(),
            cells = cells,
            "Bulk put received"
        );
        Ok(())
    }
}
