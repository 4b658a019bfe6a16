//! JsonRequestBuilder - one cell per top-level JSON field

use bytes::Bytes;
use contracts::{
    Cell, ComplexFieldStrategy, ContractError, FlowRecord, JsonBuilderConfig, RequestBuilder,
    WriteRequest,
};
use serde_json::{Map, Value};
use tracing::{error, instrument, warn};

use crate::cell::{parse_timestamp, resolve_bytes};
use crate::error::{BuildError, Result};
use crate::value::ValueSource;

/// Where the row key comes from
#[derive(Debug, Clone)]
enum KeySource {
    /// Top-level JSON field, excluded from the cells
    Field(String),
    /// Configured value source
    Value(ValueSource),
}

/// Builds a multi-cell write from a flat JSON object in the record content
#[derive(Debug, Clone)]
pub struct JsonRequestBuilder {
    destination: ValueSource,
    key: KeySource,
    family: Bytes,
    complex_fields: ComplexFieldStrategy,
    timestamp: Option<ValueSource>,
}

impl JsonRequestBuilder {
    /// Create from configuration
    pub fn from_config(config: &JsonBuilderConfig) -> Result<Self> {
        let key = match (&config.key_field, &config.key) {
            (Some(field), _) if !field.trim().is_empty() => KeySource::Field(field.clone()),
            (_, Some(raw)) => KeySource::Value(ValueSource::parse("key", raw)?),
            _ => {
                return Err(BuildError::MissingSetting {
                    field: "key_field".into(),
                })
            }
        };

        Ok(Self {
            destination: ValueSource::parse("destination", &config.destination)?,
            key,
            family: Bytes::copy_from_slice(config.family.as_bytes()),
            complex_fields: config.complex_fields,
            timestamp: config
                .timestamp
                .as_deref()
                .map(|raw| ValueSource::parse("timestamp", raw))
                .transpose()?,
        })
    }

    fn parse_object(
        &self,
        record: &FlowRecord,
    ) -> std::result::Result<Map<String, Value>, ContractError> {
        match serde_json::from_slice::<Value>(&record.content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(self.fail(
                record,
                format!("expected a JSON object, found {}", value_kind(&other)),
            )),
            Err(e) => Err(self.fail(record, format!("content is not valid JSON: {e}"))),
        }
    }

    fn take_key(
        &self,
        record: &FlowRecord,
        map: &mut Map<String, Value>,
    ) -> std::result::Result<Option<Bytes>, ContractError> {
        match &self.key {
            KeySource::Value(source) => Ok(resolve_bytes(source, record)),
            KeySource::Field(field) => match map.shift_remove(field) {
                None | Some(Value::Null) => Ok(None),
                Some(Value::String(s)) => Ok(Some(Bytes::from(s))),
                Some(v @ (Value::Bool(_) | Value::Number(_))) => {
                    Ok(Some(Bytes::from(v.to_string())))
                }
                Some(other) => Err(self.fail(
                    record,
                    format!("key field '{field}' holds a {}", value_kind(&other)),
                )),
            },
        }
    }

    fn cell_value(
        &self,
        record: &FlowRecord,
        name: &str,
        value: Value,
    ) -> std::result::Result<Option<Bytes>, ContractError> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(Bytes::from(s))),
            Value::Bool(_) | Value::Number(_) => Ok(Some(Bytes::from(value.to_string()))),
            Value::Array(_) | Value::Object(_) => match self.complex_fields {
                ComplexFieldStrategy::Fail => Err(self.fail(
                    record,
                    format!("complex field '{name}' is not allowed"),
                )),
                ComplexFieldStrategy::Warn => {
                    warn!(record_id = %record.id, field = name, "Skipping complex field");
                    Ok(None)
                }
                ComplexFieldStrategy::Ignore => Ok(None),
                ComplexFieldStrategy::Text => Ok(Some(Bytes::from(value.to_string()))),
            },
        }
    }

    fn fail(&self, record: &FlowRecord, message: String) -> ContractError {
        error!(
            record_id = %record.id,
            error = %message,
            "Could not build write request from JSON content"
        );
        ContractError::request_build(&record.id, message)
    }
}

impl RequestBuilder<FlowRecord> for JsonRequestBuilder {
    fn name(&self) -> &str {
        "json"
    }

    #[instrument(name = "json_builder_build", skip(self, record), fields(record_id = %record.id))]
    fn build(&self, record: &FlowRecord) -> std::result::Result<WriteRequest, ContractError> {
        let mut map = self.parse_object(record)?;
        let key = self.take_key(record, &mut map)?;

        let timestamp = match self.timestamp.as_ref().and_then(|s| s.resolve(record)) {
            Some(raw) => Some(parse_timestamp(record, raw)?),
            None => None,
        };

        let mut cells = Vec::with_capacity(map.len());
        for (name, value) in map {
            if let Some(bytes) = self.cell_value(record, &name, value)? {
                cells.push(Cell {
                    family: Some(self.family.clone()),
                    qualifier: Some(Bytes::from(name)),
                    value: Some(bytes),
                    timestamp,
                });
            }
        }

        Ok(WriteRequest {
            destination: self
                .destination
                .resolve(record)
                .unwrap_or_default()
                .to_string(),
            key,
            cells,
        })
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
