//! WriteRequest - RequestBuilder output, WriteClient input
//!
//! A keyed, multi-cell write addressed to one destination.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single field write
///
/// Family, qualifier and value are all required for the cell to be
/// well-formed. They are optional here because builders may fail to
/// resolve them; the dispatcher rejects the request in that case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub family: Option<Bytes>,
    pub qualifier: Option<Bytes>,
    pub value: Option<Bytes>,
    /// Explicit cell timestamp (milliseconds), backend default when absent
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl Cell {
    /// Create a well-formed cell without a timestamp
    pub fn new(
        family: impl Into<Bytes>,
        qualifier: impl Into<Bytes>,
        value: impl Into<Bytes>,
    ) -> Self {
        Self {
            family: Some(family.into()),
            qualifier: Some(qualifier.into()),
            value: Some(value.into()),
            timestamp: None,
        }
    }

    /// Set the cell timestamp
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn is_well_formed(&self) -> bool {
        self.family.is_some() && self.qualifier.is_some() && self.value.is_some()
    }
}

/// Structural defect of a [`WriteRequest`]
///
/// Variants are declared in reporting priority: when several defects are
/// present, the first one is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissingField {
    Destination,
    Key,
    Cells,
    MalformedCell,
}

impl MissingField {
    /// Short reason used in logs and routing details
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Destination => "missing destination",
            Self::Key => "missing key",
            Self::Cells => "no columns provided",
            Self::MalformedCell => "malformed cell",
        }
    }
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Keyed write addressed to a destination (e.g. a table row)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRequest {
    /// Logical target name (e.g. table)
    pub destination: String,

    /// Row key within the destination
    pub key: Option<Bytes>,

    /// Field writes, in insertion order
    pub cells: Vec<Cell>,
}

impl WriteRequest {
    pub fn new(destination: impl Into<String>, key: impl Into<Bytes>, cells: Vec<Cell>) -> Self {
        Self {
            destination: destination.into(),
            key: Some(key.into()),
            cells,
        }
    }

    /// First structural defect, checked as destination, key, cells, then
    /// cell well-formedness. `None` means the request is valid.
    pub fn missing_field(&self) -> Option<MissingField> {
        if self.destination.trim().is_empty() {
            Some(MissingField::Destination)
        } else if self.key.is_none() {
            Some(MissingField::Key)
        } else if self.cells.is_empty() {
            Some(MissingField::Cells)
        } else if !self.cells.iter().all(Cell::is_well_formed) {
            Some(MissingField::MalformedCell)
        } else {
            None
        }
    }

    pub fn is_valid(&self) -> bool {
        self.missing_field().is_none()
    }

    /// Key decoded as UTF-8 text (lossy), empty when absent
    pub fn key_text(&self) -> String {
        self.key
            .as_deref()
            .map(|k| String::from_utf8_lossy(k).into_owned())
            .unwrap_or_default()
    }

    /// `<scheme>://<destination>/<key-as-text>`
    pub fn transit_uri(&self, scheme: &str) -> String {
        format!("{}://{}/{}", scheme, self.destination, self.key_text())
    }
}
