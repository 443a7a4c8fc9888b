//! Address change detection strategies.
//!
//! Each watcher runs as its own task and reports "the address may have
//! changed" on a shared channel. None of them decide whether it actually
//! did; the registry does.

use crate::navigation::location::Location;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

/// A possible address change reported by a watcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchSignal {
    /// Watcher that produced the signal
    pub source: &'static str,
    /// What was observed
    pub reason: String,
}

/// Pluggable address change detector.
pub trait NavigationWatcher: Send + Sync {
    /// Watcher name.
    fn name(&self) -> &'static str;

    /// Start watching, reporting on `notify` until it closes or the task is aborted.
    fn spawn(&self, notify: mpsc::UnboundedSender<WatchSignal>) -> JoinHandle<()>;
}

/// Re-checks the address on a fixed interval.
pub struct PollingWatcher {
    interval: Duration,
}

impl PollingWatcher {
    /// Poll every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl NavigationWatcher for PollingWatcher {
    fn name(&self) -> &'static str {
        "polling"
    }

    fn spawn(&self, notify: mpsc::UnboundedSender<WatchSignal>) -> JoinHandle<()> {
        let period = self.interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; the registry checks on start anyway.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                trace!("poll tick");
                let signal = WatchSignal {
                    source: "polling",
                    reason: "interval".to_string(),
                };
                if notify.send(signal).is_err() {
                    break;
                }
            }
        })
    }
}

/// Reacts to hooked push/replace/back navigation.
///
/// Each signal is held for a settle delay so the page finishes its own
/// post-navigation work before the address is checked.
pub struct HistoryWatcher {
    location: Arc<dyn Location>,
    settle: Duration,
}

impl HistoryWatcher {
    /// Watch `location`, waiting `settle` after each signal.
    pub fn new(location: Arc<dyn Location>, settle: Duration) -> Self {
        Self { location, settle }
    }
}

impl NavigationWatcher for HistoryWatcher {
    fn name(&self) -> &'static str {
        "history"
    }

    fn spawn(&self, notify: mpsc::UnboundedSender<WatchSignal>) -> JoinHandle<()> {
        let settle = self.settle;
        let signals = self.location.navigation_signals();
        tokio::spawn(async move {
            let Some(mut signals) = signals else {
                debug!("location exposes no navigation hooks, history watcher idle");
                return;
            };
            loop {
                let signal = match signals.recv().await {
                    Ok(signal) => signal,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let notify = notify.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(settle).await;
                    let _ = notify.send(WatchSignal {
                        source: "history",
                        reason: signal.label().to_string(),
                    });
                });
            }
        })
    }
}
