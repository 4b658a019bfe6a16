//! RequestBuilder trait - record to write request extraction
//!
//! Implemented per use case (cell attributes, JSON content, ...).

use crate::{ContractError, Record, WriteRequest};

/// Converts one record into a candidate write request
///
/// The returned request may still be invalid; validation is the
/// dispatcher's responsibility.
pub trait RequestBuilder<R: Record>: Send + Sync {
    /// Builder name (used for logging)
    fn name(&self) -> &str;

    /// Derive a write request from a record
    ///
    /// # Errors
    /// Returns a record-specific extraction error. Implementations log the
    /// failure with the record identity before returning it.
    fn build(&self, record: &R) -> Result<WriteRequest, ContractError>;
}

impl<R: Record, B: RequestBuilder<R> + ?Sized> RequestBuilder<R> for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn build(&self, record: &R) -> Result<WriteRequest, ContractError> {
        (**self).build(record)
    }
}
