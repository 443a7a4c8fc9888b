//! Page address source.
//!
//! [`Location`] is read-only access to the address the page shows.
//! [`SharedLocation`] is an in-memory page address with a history stack
//! whose push/replace/back calls announce themselves as
//! [`NavigationSignal`]s, the way a hooked history API would.

use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// A navigation call observed on the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavigationSignal {
    /// Address pushed without reload
    PushState(String),
    /// Address replaced without reload
    ReplaceState(String),
    /// Back/forward navigation
    PopState,
}

impl NavigationSignal {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            NavigationSignal::PushState(_) => "pushState",
            NavigationSignal::ReplaceState(_) => "replaceState",
            NavigationSignal::PopState => "popstate",
        }
    }
}

/// Read access to the current page address.
pub trait Location: Send + Sync {
    /// The current address.
    fn href(&self) -> String;

    /// Stream of hooked navigation calls, if the host exposes one.
    fn navigation_signals(&self) -> Option<broadcast::Receiver<NavigationSignal>> {
        None
    }
}

#[derive(Debug)]
struct History {
    entries: Vec<String>,
    index: usize,
}

/// In-memory page address with a history stack.
#[derive(Clone)]
pub struct SharedLocation {
    history: Arc<RwLock<History>>,
    signals: broadcast::Sender<NavigationSignal>,
}

impl SharedLocation {
    /// Start at `url`.
    pub fn new(url: &str) -> Self {
        let (signals, _) = broadcast::channel(64);
        Self {
            history: Arc::new(RwLock::new(History {
                entries: vec![url.to_string()],
                index: 0,
            })),
            signals,
        }
    }

    /// Change the address without announcing it. Only polling sees this.
    pub fn set_href(&self, url: &str) {
        let mut history = self.history.write().unwrap_or_else(PoisonError::into_inner);
        let index = history.index;
        history.entries[index] = url.to_string();
    }

    /// Push a new entry and announce it.
    pub fn push_state(&self, url: &str) {
        {
            let mut history = self.history.write().unwrap_or_else(PoisonError::into_inner);
            let next = history.index + 1;
            history.entries.truncate(next);
            history.entries.push(url.to_string());
            history.index = next;
        }
        let _ = self.signals.send(NavigationSignal::PushState(url.to_string()));
    }

    /// Replace the current entry and announce it.
    pub fn replace_state(&self, url: &str) {
        self.set_href(url);
        let _ = self.signals.send(NavigationSignal::ReplaceState(url.to_string()));
    }

    /// Step back one entry. Returns false at the start of history.
    pub fn back(&self) -> bool {
        self.go(-1)
    }

    /// Step forward one entry. Returns false at the end of history.
    pub fn forward(&self) -> bool {
        self.go(1)
    }

    fn go(&self, delta: isize) -> bool {
        {
            let mut history = self.history.write().unwrap_or_else(PoisonError::into_inner);
            let target = history.index as isize + delta;
            if target < 0 || target as usize >= history.entries.len() {
                return false;
            }
            history.index = target as usize;
        }
        let _ = self.signals.send(NavigationSignal::PopState);
        true
    }
}

impl Location for SharedLocation {
    fn href(&self) -> String {
        let history = self.history.read().unwrap_or_else(PoisonError::into_inner);
        history.entries[history.index].clone()
    }

    fn navigation_signals(&self) -> Option<broadcast::Receiver<NavigationSignal>> {
        Some(self.signals.subscribe())
    }
}
