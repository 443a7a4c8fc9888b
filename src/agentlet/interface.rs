//! Agentlet interface definition.
//!
//! Defines the capability contract every agentlet must implement.

use crate::agentlet::pattern::Pattern;
use crate::core::DEFAULT_TRIGGER;
use crate::events::EventBus;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Agentlet metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentletMetadata {
    /// Agentlet name
    pub name: String,
    /// Version
    pub version: String,
    /// Description
    pub description: String,
    /// Address patterns
    pub patterns: Vec<Pattern>,
    /// Has `init` completed
    pub initialized: bool,
    /// Is currently active
    pub active: bool,
}

impl AgentletMetadata {
    /// Create new metadata.
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            description: String::new(),
            patterns: Vec::new(),
            initialized: false,
            active: false,
        }
    }

    /// Set description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    /// Set patterns.
    pub fn with_patterns(mut self, patterns: Vec<Pattern>) -> Self {
        self.patterns = patterns;
        self
    }
}

/// Context passed to `activate` and `cleanup`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActivationContext {
    /// What caused the transition
    pub trigger: Option<String>,
    /// Address at the time of the transition
    pub url: String,
    /// Free-form data
    pub data: HashMap<String, serde_json::Value>,
}

impl ActivationContext {
    /// Create a context for an address.
    pub fn new(url: &str) -> Self {
        Self {
            trigger: None,
            url: url.to_string(),
            data: HashMap::new(),
        }
    }

    /// Set the trigger.
    pub fn with_trigger(mut self, trigger: &str) -> Self {
        self.trigger = Some(trigger.to_string());
        self
    }

    /// Attach a data value.
    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data.insert(key.to_string(), value);
        self
    }

    /// Trigger label, falling back to the default.
    pub fn trigger_label(&self) -> &str {
        self.trigger.as_deref().unwrap_or(DEFAULT_TRIGGER)
    }

    /// Get a data value.
    pub fn get<T: for<'de> serde::Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.data.get(key).and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Result type for agentlet hooks.
pub type AgentletResult<T> = std::result::Result<T, AgentletError>;

/// Error raised by an agentlet hook.
#[derive(Clone, Debug)]
pub struct AgentletError {
    /// Error message
    pub message: String,
    /// Is recoverable
    pub recoverable: bool,
}

impl AgentletError {
    /// Create a new error.
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            recoverable: true,
        }
    }

    /// Create a fatal error.
    pub fn fatal(message: &str) -> Self {
        Self {
            message: message.to_string(),
            recoverable: false,
        }
    }
}

impl std::fmt::Display for AgentletError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AgentletError {}

/// Trait every agentlet implements.
///
/// Hooks take `&self`; agentlets keep their own state behind interior
/// mutability because the registry shares them as `Arc<dyn Agentlet>`.
#[async_trait]
pub trait Agentlet: Send + Sync {
    /// Unique name. Used as the registry key.
    fn name(&self) -> &str;

    /// Does this agentlet apply to the address.
    fn check_pattern(&self, url: &str) -> bool;

    /// One-time initialization. Called at most once per instance by the registry.
    async fn init(&self) -> AgentletResult<()>;

    /// Start running for the current address.
    async fn activate(&self, ctx: &ActivationContext) -> AgentletResult<()>;

    /// Stop running and release anything `activate` acquired.
    async fn cleanup(&self, ctx: &ActivationContext) -> AgentletResult<()>;

    /// Describe the agentlet.
    fn metadata(&self) -> AgentletMetadata;

    /// Receive the shared event bus on registration.
    fn attach_event_bus(&self, _bus: EventBus) {}
}
