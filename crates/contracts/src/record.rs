//! Record - the unit of inbound work
//!
//! The dispatcher never inspects a record's content; it only threads the
//! record through to a routing decision.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Inbound unit of work owned by the caller's queueing system.
pub trait Record {
    /// Identity used when logging routing decisions
    fn record_id(&self) -> &str;
}

/// Attribute-carrying record with a byte payload
///
/// On the wire (JSON lines) the content is UTF-8 text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRecord {
    /// Unique identifier
    pub id: String,

    /// Free-form string attributes
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// Payload
    #[serde(default, with = "content_text")]
    pub content: Bytes,
}

impl FlowRecord {
    /// Create a record with no attributes
    pub fn new(id: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            id: id.into(),
            attributes: HashMap::new(),
            content: content.into(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Look up an attribute
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

impl Record for FlowRecord {
    fn record_id(&self) -> &str {
        &self.id
    }
}

mod content_text {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(content: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(content))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Bytes::from(text))
    }
}
