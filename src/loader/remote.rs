//! Remote module loader.
//!
//! Fetches module source with a timeout, evaluates it in the script host,
//! and retries the whole fetch-and-evaluate step with linear backoff.

use crate::agentlet::Agentlet;
use crate::config::LoaderConfig;
use crate::core::{Error, Result};
use crate::loader::fetch::{HttpFetcher, SourceFetcher};
use crate::loader::host::{ExportTable, ScriptHost};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Per-load overrides of the loader configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadOptions {
    /// Request timeout in ms
    pub timeout: Option<u64>,
    /// Attempts before giving up
    pub retry_attempts: Option<u32>,
}

impl LoadOptions {
    /// Read overrides from a descriptor's free-form `options` object.
    ///
    /// Unknown keys are ignored; a non-object yields no overrides.
    pub fn from_value(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// Set timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout.as_millis() as u64);
        self
    }

    /// Set attempts.
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = Some(attempts);
        self
    }
}

/// Loads agentlets from the network.
#[derive(Clone)]
pub struct RemoteLoader {
    fetcher: Arc<dyn SourceFetcher>,
    host: Arc<dyn ScriptHost>,
    config: LoaderConfig,
}

impl RemoteLoader {
    /// Create a loader.
    pub fn new(fetcher: Arc<dyn SourceFetcher>, host: Arc<dyn ScriptHost>, config: LoaderConfig) -> Self {
        Self { fetcher, host, config }
    }

    /// HTTP loader over an export table.
    pub fn http(host: ExportTable, config: LoaderConfig) -> Self {
        Self::new(Arc::new(HttpFetcher::new()), Arc::new(host), config)
    }

    /// Loader settings.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Fetch text once, bounded by the configured timeout.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        self.fetch_with_timeout(url, self.config.timeout()).await
    }

    /// Load the agentlet exported as `export` by the source at `url`.
    ///
    /// On failure retries up to the attempt limit, waiting
    /// `backoff * attempt` between tries.
    pub async fn load(&self, url: &str, export: &str, options: &LoadOptions) -> Result<Arc<dyn Agentlet>> {
        let attempts = options.retry_attempts.unwrap_or(self.config.retry_attempts).max(1);
        let timeout = options
            .timeout
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.config.timeout());

        let mut last_error = String::new();
        for attempt in 1..=attempts {
            match self.try_load(url, export, timeout).await {
                Ok(agentlet) => {
                    info!(url, export, attempt, agentlet = agentlet.name(), "agentlet loaded");
                    return Ok(agentlet);
                }
                Err(e) => {
                    warn!(url, export, attempt, attempts, error = %e, "agentlet load attempt failed");
                    last_error = e.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(self.config.retry_backoff() * attempt).await;
                    }
                }
            }
        }

        Err(Error::LoadFailed {
            url: url.to_string(),
            attempts,
            last_error,
        })
    }

    async fn try_load(&self, url: &str, export: &str, timeout: Duration) -> Result<Arc<dyn Agentlet>> {
        let source = self.fetch_with_timeout(url, timeout).await?;
        let agentlet = self
            .host
            .evaluate(&source, export)
            .await?
            .ok_or_else(|| Error::ExportMissing(export.to_string()))?;

        if agentlet.name().trim().is_empty() {
            return Err(Error::InvalidExport(export.to_string(), "name is empty".to_string()));
        }
        Ok(agentlet)
    }

    async fn fetch_with_timeout(&self, url: &str, timeout: Duration) -> Result<String> {
        // Elapsing drops the fetch future, which aborts the request.
        match tokio::time::timeout(timeout, self.fetcher.fetch(url)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(timeout.as_millis() as u64)),
        }
    }
}
