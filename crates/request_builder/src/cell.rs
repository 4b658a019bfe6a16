//! CellRequestBuilder - one cell per record
//!
//! Destination, key, family and qualifier come from configuration or record
//! attributes; the cell value is the record content.

use bytes::Bytes;
use contracts::{
    Cell, CellBuilderConfig, ContractError, FlowRecord, RequestBuilder, WriteRequest,
};
use tracing::{error, instrument};

use crate::error::Result;
use crate::value::ValueSource;

/// Builds a single-cell write from record attributes and content
#[derive(Debug, Clone)]
pub struct CellRequestBuilder {
    destination: ValueSource,
    key: ValueSource,
    family: ValueSource,
    qualifier: ValueSource,
    timestamp: Option<ValueSource>,
}

impl CellRequestBuilder {
    /// Create from configuration
    pub fn from_config(config: &CellBuilderConfig) -> Result<Self> {
        Ok(Self {
            destination: ValueSource::parse("destination", &config.destination)?,
            key: ValueSource::parse("key", &config.key)?,
            family: ValueSource::parse("family", &config.family)?,
            qualifier: ValueSource::parse("qualifier", &config.qualifier)?,
            timestamp: config
                .timestamp
                .as_deref()
                .map(|raw| ValueSource::parse("timestamp", raw))
                .transpose()?,
        })
    }
}

impl RequestBuilder<FlowRecord> for CellRequestBuilder {
    fn name(&self) -> &str {
        "cell"
    }

    #[instrument(name = "cell_builder_build", skip(self, record), fields(record_id = %record.id))]
    fn build(&self, record: &FlowRecord) -> std::result::Result<WriteRequest, ContractError> {
        let timestamp = match self.timestamp.as_ref().and_then(|s| s.resolve(record)) {
            Some(raw) => Some(parse_timestamp(record, raw)?),
            None => None,
        };

        let cell = Cell {
            family: resolve_bytes(&self.family, record),
            qualifier: resolve_bytes(&self.qualifier, record),
            value: (!record.content.is_empty()).then(|| record.content.clone()),
            timestamp,
        };

        Ok(WriteRequest {
            destination: self
                .destination
                .resolve(record)
                .unwrap_or_default()
                .to_string(),
            key: resolve_bytes(&self.key, record),
            cells: vec![cell],
        })
    }
}

pub(crate) fn resolve_bytes(source: &ValueSource, record: &FlowRecord) -> Option<Bytes> {
    source
        .resolve(record)
        .map(|text| Bytes::copy_from_slice(text.as_bytes()))
}

pub(crate) fn parse_timestamp(
    record: &FlowRecord,
    raw: &str,
) -> std::result::Result<i64, ContractError> {
    raw.trim().parse::<i64>().map_err(|e| {
        error!(
            record_id = %record.id,
            timestamp = raw,
            error = %e,
            "Invalid timestamp; could not build write request"
        );
        ContractError::request_build(&record.id, format!("invalid timestamp '{raw}': {e}"))
    })
}
