//! Source fetching.
//!
//! [`SourceFetcher`] retrieves module source and registry documents.
//! Timeouts are applied by the caller, which drops the fetch future when
//! the deadline passes.

use crate::core::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Retrieves text from a URL.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch the body at `url`. Non-success statuses are errors.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// HTTP fetcher backed by `reqwest`.
#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create with a default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a preconfigured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!(url, "fetching");
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[derive(Clone)]
enum StaticEntry {
    Body(String),
    Failure(String),
    Status(u16),
}

/// In-memory fetcher serving fixed responses.
///
/// Counts requests per URL; unknown URLs answer 404.
#[derive(Clone, Default)]
pub struct StaticFetcher {
    entries: Arc<RwLock<HashMap<String, StaticEntry>>>,
    counts: Arc<RwLock<HashMap<String, Arc<AtomicUsize>>>>,
    delay: Option<std::time::Duration>,
}

impl StaticFetcher {
    /// Create an empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait this long before answering each request.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Serve `body` at `url`.
    pub fn insert(&self, url: &str, body: &str) {
        self.set(url, StaticEntry::Body(body.to_string()));
    }

    /// Fail every request to `url` with a network error.
    pub fn fail(&self, url: &str, message: &str) {
        self.set(url, StaticEntry::Failure(message.to_string()));
    }

    /// Answer `url` with an HTTP status.
    pub fn status(&self, url: &str, status: u16) {
        self.set(url, StaticEntry::Status(status));
    }

    /// Requests seen for `url`.
    pub fn fetch_count(&self, url: &str) -> usize {
        self.counts
            .read()
            .ok()
            .and_then(|c| c.get(url).map(|n| n.load(Ordering::SeqCst)))
            .unwrap_or(0)
    }

    fn set(&self, url: &str, entry: StaticEntry) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(url.to_string(), entry);
        }
    }

    fn record(&self, url: &str) {
        if let Ok(mut counts) = self.counts.write() {
            counts
                .entry(url.to_string())
                .or_insert_with(|| Arc::new(AtomicUsize::new(0)))
                .fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl SourceFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.record(url);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let entry = self
            .entries
            .read()
            .map_err(|_| Error::Internal("fetcher lock poisoned".to_string()))?
            .get(url)
            .cloned();

        match entry {
            Some(StaticEntry::Body(body)) => Ok(body),
            Some(StaticEntry::Failure(message)) => Err(Error::Fetch(message)),
            Some(StaticEntry::Status(status)) => Err(Error::HttpStatus {
                url: url.to_string(),
                status,
            }),
            None => Err(Error::HttpStatus {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
