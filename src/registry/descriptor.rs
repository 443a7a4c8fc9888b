//! Remote registry documents.
//!
//! A document lists agentlets loadable from the network, either as a bare
//! array (legacy) or under an `agentlets` key.

use crate::core::{Error, Result};
use crate::loader::LoadOptions;
use serde::{Deserialize, Serialize};

/// One loadable agentlet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentletDescriptor {
    /// Agentlet name
    pub name: String,
    /// Source URL
    pub url: String,
    /// Export name the host must produce
    pub module: String,
    /// Loader overrides and free-form settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Value>,
}

impl AgentletDescriptor {
    /// Create a descriptor.
    pub fn new(name: &str, url: &str, module: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            module: module.to_string(),
            options: None,
        }
    }

    /// Attach options.
    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = Some(options);
        self
    }

    /// Loader overrides carried in `options`.
    pub fn load_options(&self) -> LoadOptions {
        self.options.as_ref().map(LoadOptions::from_value).unwrap_or_default()
    }
}

/// Parsed registry document.
///
/// Entries are kept as raw JSON so one malformed descriptor does not
/// reject its siblings.
#[derive(Clone, Debug)]
pub struct RegistryDocument {
    entries: Vec<serde_json::Value>,
}

impl RegistryDocument {
    /// Parse either accepted shape.
    pub fn parse(text: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| Error::InvalidRegistryDocument(e.to_string()))?;

        let entries = match value {
            serde_json::Value::Array(entries) => entries,
            serde_json::Value::Object(mut map) => match map.remove("agentlets") {
                Some(serde_json::Value::Array(entries)) => entries,
                _ => {
                    return Err(Error::InvalidRegistryDocument(
                        "expected an array or an object with an agentlets array".to_string(),
                    ))
                }
            },
            _ => {
                return Err(Error::InvalidRegistryDocument(
                    "expected an array or an object with an agentlets array".to_string(),
                ))
            }
        };
        Ok(Self { entries })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the document lists nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode each entry independently.
    pub fn descriptors(&self) -> Vec<Result<AgentletDescriptor>> {
        self.entries
            .iter()
            .map(|entry| serde_json::from_value(entry.clone()).map_err(Error::from))
            .collect()
    }
}
