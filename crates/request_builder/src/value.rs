//! 配置值来源：字面量或 `${attribute}` 引用

use contracts::FlowRecord;

use crate::error::{BuildError, Result};

/// Where a request field gets its value from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Fixed text
    Literal(String),
    /// Named record attribute
    Attribute(String),
}

impl ValueSource {
    /// Parse a configured value: `${name}` is an attribute reference,
    /// anything else is a literal.
    pub fn parse(field: &str, raw: &str) -> Result<Self> {
        let Some(rest) = raw.strip_prefix("${") else {
            return Ok(Self::Literal(raw.to_string()));
        };

        let name = rest
            .strip_suffix('}')
            .ok_or_else(|| BuildError::InvalidValueSource {
                field: field.to_string(),
                message: format!("unterminated attribute reference '{raw}'"),
            })?
            .trim();

        if name.is_empty() || name.contains(['$', '{', '}']) {
            return Err(BuildError::InvalidValueSource {
                field: field.to_string(),
                message: format!("invalid attribute reference '{raw}'"),
            });
        }

        Ok(Self::Attribute(name.to_string()))
    }

    /// Resolve against a record; a missing attribute resolves to `None`
    pub fn resolve<'a>(&'a self, record: &'a FlowRecord) -> Option<&'a str> {
        match self {
            Self::Literal(text) => Some(text),
            Self::Attribute(name) => record.attribute(name),
        }
    }
}
