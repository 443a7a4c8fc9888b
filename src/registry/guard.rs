//! In-flight operation table.
//!
//! Collapses concurrent duplicate work: the first caller for a
//! `(resource, action)` key gets a guard, later callers get `None` until
//! the guard drops.

use crate::core::GuardKey;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Table of keys currently being worked on.
#[derive(Clone, Debug, Default)]
pub struct InFlight {
    keys: Arc<Mutex<HashSet<GuardKey>>>,
}

impl InFlight {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`. `None` if another operation already holds it.
    pub fn try_acquire(&self, key: GuardKey) -> Option<InFlightGuard> {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        if !keys.insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            key,
            keys: Arc::clone(&self.keys),
        })
    }

    /// Is `key` held.
    pub fn contains(&self, key: &GuardKey) -> bool {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner).contains(key)
    }

    /// Number of held keys.
    pub fn len(&self) -> usize {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True if nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases its key on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    key: GuardKey,
    keys: Arc<Mutex<HashSet<GuardKey>>>,
}

impl InFlightGuard {
    /// The held key.
    pub fn key(&self) -> &GuardKey {
        &self.key
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
