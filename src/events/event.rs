//! Lifecycle events announced by the engine.

use crate::agentlet::ActivationContext;
use crate::core::{now, Timestamp};
use serde::{Deserialize, Serialize};

/// A lifecycle transition.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "topic", rename_all_fields = "camelCase")]
pub enum RegistryEvent {
    #[serde(rename = "module:registered")]
    ModuleRegistered { module: String },

    #[serde(rename = "module:unregistered")]
    ModuleUnregistered { module: String },

    #[serde(rename = "module:activated")]
    ModuleActivated {
        module: String,
        context: ActivationContext,
    },

    #[serde(rename = "module:activationFailed")]
    ModuleActivationFailed { module: String, error: String },

    #[serde(rename = "module:deactivated")]
    ModuleDeactivated { module: String },

    #[serde(rename = "application:detected")]
    ApplicationDetected { module: String, url: String },

    #[serde(rename = "application:notDetected")]
    ApplicationNotDetected { url: String },

    #[serde(rename = "url:changed")]
    UrlChanged {
        old_url: Option<String>,
        new_url: String,
    },

    #[serde(rename = "registry:loaded")]
    RegistryLoaded { url: String, agentlet_count: usize },

    #[serde(rename = "registry:loadFailed")]
    RegistryLoadFailed { url: String, error: String },
}

impl RegistryEvent {
    /// Topic name of the event.
    pub fn topic(&self) -> &'static str {
        match self {
            RegistryEvent::ModuleRegistered { .. } => "module:registered",
            RegistryEvent::ModuleUnregistered { .. } => "module:unregistered",
            RegistryEvent::ModuleActivated { .. } => "module:activated",
            RegistryEvent::ModuleActivationFailed { .. } => "module:activationFailed",
            RegistryEvent::ModuleDeactivated { .. } => "module:deactivated",
            RegistryEvent::ApplicationDetected { .. } => "application:detected",
            RegistryEvent::ApplicationNotDetected { .. } => "application:notDetected",
            RegistryEvent::UrlChanged { .. } => "url:changed",
            RegistryEvent::RegistryLoaded { .. } => "registry:loaded",
            RegistryEvent::RegistryLoadFailed { .. } => "registry:loadFailed",
        }
    }

    /// Agentlet the event concerns, if any.
    pub fn module(&self) -> Option<&str> {
        match self {
            RegistryEvent::ModuleRegistered { module }
            | RegistryEvent::ModuleUnregistered { module }
            | RegistryEvent::ModuleActivated { module, .. }
            | RegistryEvent::ModuleActivationFailed { module, .. }
            | RegistryEvent::ModuleDeactivated { module }
            | RegistryEvent::ApplicationDetected { module, .. } => Some(module),
            _ => None,
        }
    }
}

/// Envelope data attached to every published event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event id
    pub id: uuid::Uuid,
    /// Publish time
    pub timestamp: Timestamp,
    /// Publisher
    pub source: String,
}

impl EventMetadata {
    /// Create metadata for a source.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            timestamp: now(),
            source: source.into(),
        }
    }
}
