//! MemoryClient - in-process store with failure injection

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use contracts::{ContractError, WriteClient, WriteRequest};
use tracing::{debug, instrument};

/// One observed bulk write call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutCall {
    pub destination: String,
    pub requests: usize,
    pub ok: bool,
}

/// Client keeping rows in memory
///
/// Destinations listed at construction fail every put, which makes group
/// failure handling observable without a real backend.
#[derive(Debug, Default)]
pub struct MemoryClient {
    /// Destinations whose puts fail
    fail_destinations: HashSet<String>,
    /// Stored rows (destination -> requests)
    rows: Mutex<HashMap<String, Vec<WriteRequest>>>,
    /// Every put call, in order
    calls: Mutex<Vec<PutCall>>,
}

impl MemoryClient {
    /// Create a client where every put succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client failing puts to the given destinations
    pub fn failing<I, S>(destinations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fail_destinations: destinations.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Rows stored for a destination
    pub fn rows(&self, destination: &str) -> Vec<WriteRequest> {
        lock(&self.rows)
            .get(destination)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of rows stored across all destinations
    pub fn row_count(&self) -> usize {
        lock(&self.rows).values().map(Vec::len).sum()
    }

    /// All put calls observed so far
    pub fn calls(&self) -> Vec<PutCall> {
        lock(&self.calls).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl WriteClient for MemoryClient {
    fn name(&self) -> &str {
        "memory"
    }

    #[instrument(
        name = "memory_client_put",
        skip(self, requests),
        fields(destination = %destination, requests = requests.len())
    )]
    async fn put(&self, destination: &str, requests: &[WriteRequest]) -> Result<(), ContractError> {
        let ok = !self.fail_destinations.contains(destination);
        lock(&self.calls).push(PutCall {
            destination: destination.to_string(),
            requests: requests.len(),
            ok,
        });

        if !ok {
            return Err(ContractError::write_failed(
                destination,
                "injected failure",
            ));
        }

        lock(&self.rows)
            .entry(destination.to_string())
            .or_default()
            .extend_from_slice(requests);
        debug!(destination = %destination, "Rows stored");
        Ok(())
    }
}
