//! WriteClient trait - bulk keyed write capability
//!
//! Defines the abstract interface for storage backends.

use crate::{ContractError, WriteRequest};

/// Bulk write client
///
/// One `put` call carries every request addressed to one destination.
/// Retry, pooling and authentication belong to the implementation.
#[trait_variant::make(WriteClient: Send)]
pub trait LocalWriteClient {
    /// Client name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write all requests to `destination` as a single bulk operation
    ///
    /// # Errors
    /// Returns write error (should include context); the whole group is
    /// treated as failed.
    async fn put(&self, destination: &str, requests: &[WriteRequest])
        -> Result<(), ContractError>;
}
