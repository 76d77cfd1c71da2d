//! # Engine Configuration
//!
//! Formatting and parsing options are plain values handed to the engines at
//! construction. Nothing is read from global state.
//!
//! ```toml
//! [serializer]
//! key_transform = "camel"
//! relationship_linkage = true
//!
//! [sort]
//! descending_marker = "-"
//! separator = ","
//! ```

use crate::error::ConfigError;
use crate::value::KeyTransform;
use serde::Deserialize;

/// Options for [`SerializationEngine`](crate::serializer::SerializationEngine).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Rewrites attribute, meta and relationship member names.
    pub key_transform: KeyTransform,
    /// Emit a `relationships` member with linkage for every relationship
    /// expanded at that node.
    pub relationship_linkage: bool,
}

/// Options for [`SortEngine`](crate::sort::SortEngine).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SortConfig {
    pub descending_marker: char,
    pub separator: char,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            descending_marker: '-',
            separator: ',',
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub serializer: SerializerConfig,
    pub sort: SortConfig,
}

impl EngineConfig {
    /// Parses a TOML document; missing tables and keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}
