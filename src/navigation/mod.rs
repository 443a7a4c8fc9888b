//! Navigation Module
//!
//! Detects page address changes without reloads:
//! - Address source and history hooks
//! - Polling and history watchers
//! - Debounced monitor

pub mod location;
pub mod monitor;
pub mod watcher;

pub use location::{Location, NavigationSignal, SharedLocation};
pub use monitor::{NavigationMonitor, UrlChangeHandler};
pub use watcher::{HistoryWatcher, NavigationWatcher, PollingWatcher, WatchSignal};
