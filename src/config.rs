//! Engine configuration.
//!
//! All timings are plain milliseconds so the config round-trips through JSON.

use crate::core::{Error, Result, DEFAULT_TRIGGER};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Registry configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    /// Address poll interval
    pub poll_interval_ms: u64,
    /// Settle delay after a hooked navigation call
    pub navigation_delay_ms: u64,
    /// Window in which navigation signals collapse into one check
    pub debounce_ms: u64,
    /// Trigger label for activations that carry none
    pub default_trigger: String,
    /// Remote registries loaded on start
    pub auto_load_registries: Vec<String>,
    /// Event bus buffer size
    pub event_channel_capacity: usize,
    /// Remote loader settings
    pub loader: LoaderConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            navigation_delay_ms: 100,
            debounce_ms: 50,
            default_trigger: DEFAULT_TRIGGER.to_string(),
            auto_load_registries: Vec::new(),
            event_channel_capacity: crate::events::DEFAULT_CHANNEL_CAPACITY,
            loader: LoaderConfig::default(),
        }
    }
}

impl RegistryConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Add a registry to load on start.
    pub fn with_registry(mut self, url: &str) -> Self {
        self.auto_load_registries.push(url.to_string());
        self
    }

    /// Set poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the settle delay and debounce window.
    pub fn with_navigation_timing(mut self, delay: Duration, debounce: Duration) -> Self {
        self.navigation_delay_ms = delay.as_millis() as u64;
        self.debounce_ms = debounce.as_millis() as u64;
        self
    }

    /// Set loader settings.
    pub fn with_loader(mut self, loader: LoaderConfig) -> Self {
        self.loader = loader;
        self
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::InvalidConfig("pollIntervalMs must be positive".to_string()));
        }
        if self.default_trigger.is_empty() {
            return Err(Error::InvalidConfig("defaultTrigger must not be empty".to_string()));
        }
        self.loader.validate()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn navigation_delay(&self) -> Duration {
        Duration::from_millis(self.navigation_delay_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Remote loader configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoaderConfig {
    /// Request timeout
    pub timeout_ms: u64,
    /// Attempts before giving up
    pub retry_attempts: u32,
    /// Backoff unit; attempt `n` waits `n` units before the next try
    pub retry_backoff_ms: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            retry_attempts: 3,
            retry_backoff_ms: 1000,
        }
    }
}

impl LoaderConfig {
    /// Reject zero attempts.
    pub fn validate(&self) -> Result<()> {
        if self.retry_attempts == 0 {
            return Err(Error::InvalidConfig("retryAttempts must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}
