//! Common types used across agentlet modules.

use serde::{Deserialize, Serialize};

/// Timestamp wrapper for consistent serialization.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Get current UTC timestamp.
pub fn now() -> Timestamp {
    chrono::Utc::now()
}

/// Trigger label used when an activation request carries none.
pub const DEFAULT_TRIGGER: &str = "manual";

/// Trigger label for activations caused by an address change.
pub const URL_CHANGE_TRIGGER: &str = "url-change";

/// Composite key identifying an in-flight operation on a resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuardKey {
    /// Resource the operation targets (an agentlet name)
    pub resource: String,
    /// Action being performed
    pub action: String,
}

impl GuardKey {
    /// Create a new guard key.
    pub fn new(resource: &str, action: &str) -> Self {
        Self {
            resource: resource.to_string(),
            action: action.to_string(),
        }
    }
}

impl std::fmt::Display for GuardKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}
