//! PutBlueprint - Config Loader output
//!
//! Describes a complete put pipeline: dispatcher settings, how records become
//! write requests, and which backend receives them.

use serde::{Deserialize, Serialize};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete pipeline blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Dispatcher settings
    #[serde(default)]
    pub dispatcher: DispatcherSettings,

    /// Record-to-request extraction
    pub builder: BuilderConfig,

    /// Storage backend
    #[serde(default)]
    pub client: ClientConfig,
}

/// Dispatcher settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherSettings {
    /// Scheme used in provenance transit URIs
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Records pulled per dispatch pass, must be > 0
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_scheme() -> String {
    "hbase".to_string()
}

fn default_batch_size() -> usize {
    25
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            batch_size: default_batch_size(),
        }
    }
}

/// Request builder selection
///
/// String fields accept either a literal or a `${attribute}` reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuilderConfig {
    /// One cell per record, value taken from the record content
    Cell(CellBuilderConfig),
    /// One cell per top-level field of a JSON object in the record content
    Json(JsonBuilderConfig),
}

impl BuilderConfig {
    /// Builder kind as written in configuration
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Cell(_) => "cell",
            Self::Json(_) => "json",
        }
    }

    /// Destination value source
    pub fn destination(&self) -> &str {
        match self {
            Self::Cell(c) => &c.destination,
            Self::Json(c) => &c.destination,
        }
    }
}

/// Cell builder configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellBuilderConfig {
    pub destination: String,
    pub key: String,
    pub family: String,
    pub qualifier: String,
    /// Optional cell timestamp (milliseconds)
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// JSON builder configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonBuilderConfig {
    pub destination: String,

    /// JSON field holding the row key (removed from the cell set)
    #[serde(default)]
    pub key_field: Option<String>,

    /// Row key value source, used when `key_field` is not set
    #[serde(default)]
    pub key: Option<String>,

    pub family: String,

    /// Handling of nested arrays/objects
    #[serde(default)]
    pub complex_fields: ComplexFieldStrategy,

    /// Optional timestamp applied to every cell (milliseconds)
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Handling of nested JSON values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexFieldStrategy {
    /// Reject the record
    Fail,
    /// Skip the field and log a warning
    Warn,
    /// Skip the field silently
    Ignore,
    /// Store the JSON text of the value
    #[default]
    Text,
}

/// Write client selection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientConfig {
    /// Log a summary of each bulk write
    #[default]
    Log,
    /// Append JSON lines under `base_path`, one file per destination
    File {
        #[serde(default = "default_base_path")]
        base_path: String,
    },
    /// Keep writes in memory; listed destinations fail
    Memory {
        #[serde(default)]
        fail_destinations: Vec<String>,
    },
}

fn default_base_path() -> String {
    "./output".to_string()
}

impl ClientConfig {
    /// Client kind as written in configuration
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::File { .. } => "file",
            Self::Memory { .. } => "memory",
        }
    }
}
