//! Error types for the agentlet engine.

use thiserror::Error;

/// Result type alias for agentlet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in agentlet operations.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Agentlet not found: {0}")]
    AgentletNotFound(String),

    // Network errors
    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },

    // Loading errors
    #[error("Export {0} not found after evaluation")]
    ExportMissing(String),

    #[error("Export {0} does not satisfy the agentlet contract: {1}")]
    InvalidExport(String, String),

    #[error("Failed to load {url} after {attempts} attempts: {last_error}")]
    LoadFailed {
        url: String,
        attempts: u32,
        last_error: String,
    },

    // Registry document errors
    #[error("Invalid registry document: {0}")]
    InvalidRegistryDocument(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Error::HttpStatus {
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
                status: status.as_u16(),
            },
            None => Error::Fetch(err.to_string()),
        }
    }
}
