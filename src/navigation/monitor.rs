//! Navigation monitor.
//!
//! Runs a set of watchers and funnels their signals into a single
//! debounced call to the [`UrlChangeHandler`].

use crate::navigation::watcher::{NavigationWatcher, WatchSignal};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Receives "the address may have changed" notifications.
#[async_trait]
pub trait UrlChangeHandler: Send + Sync {
    /// Re-check the address. Returns false once the handler is gone.
    async fn on_url_change(&self) -> bool;
}

/// Composes navigation watchers.
pub struct NavigationMonitor {
    watchers: Vec<Arc<dyn NavigationWatcher>>,
    debounce: Duration,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl NavigationMonitor {
    /// Create a monitor with no watchers.
    pub fn new(debounce: Duration) -> Self {
        Self {
            watchers: Vec::new(),
            debounce,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Add a watcher.
    pub fn with_watcher(mut self, watcher: Arc<dyn NavigationWatcher>) -> Self {
        self.watchers.push(watcher);
        self
    }

    /// Names of the composed watchers.
    pub fn watcher_names(&self) -> Vec<&'static str> {
        self.watchers.iter().map(|w| w.name()).collect()
    }

    /// Is the monitor running.
    pub fn is_running(&self) -> bool {
        !self.tasks.lock().unwrap_or_else(PoisonError::into_inner).is_empty()
    }

    /// Start every watcher. Returns false if already running.
    pub fn start(&self, handler: Arc<dyn UrlChangeHandler>) -> bool {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if !tasks.is_empty() {
            return false;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        for watcher in &self.watchers {
            tasks.push(watcher.spawn(tx.clone()));
        }
        tasks.push(tokio::spawn(dispatch(rx, handler, self.debounce)));

        info!(watchers = ?self.watcher_names(), "navigation monitor started");
        true
    }

    /// Stop every watcher.
    pub fn stop(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if tasks.is_empty() {
            return;
        }
        for task in tasks.drain(..) {
            task.abort();
        }
        info!("navigation monitor stopped");
    }
}

impl Drop for NavigationMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn dispatch(
    mut rx: mpsc::UnboundedReceiver<WatchSignal>,
    handler: Arc<dyn UrlChangeHandler>,
    debounce: Duration,
) {
    while let Some(signal) = rx.recv().await {
        if !debounce.is_zero() {
            tokio::time::sleep(debounce).await;
        }
        let mut collapsed = 0usize;
        while rx.try_recv().is_ok() {
            collapsed += 1;
        }
        debug!(source = signal.source, reason = %signal.reason, collapsed, "checking address");
        if !handler.on_url_change().await {
            break;
        }
    }
}
