//! Registry metrics.
//!
//! Monotonic counters, reset only on registry teardown.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric (monotonically increasing).
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    /// Create a new counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment by 1.
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment by amount.
    pub fn add(&self, amount: u64) {
        self.value.fetch_add(amount, Ordering::Relaxed);
    }

    /// Get current value.
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Reset to zero.
    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

/// Counters kept by the registry.
#[derive(Debug, Default)]
pub struct RegistryMetrics {
    /// Successful registrations
    pub total_agentlets: Counter,
    /// Successful activations
    pub activation_attempts: Counter,
    /// Failed `init`/`activate` hooks
    pub activation_failures: Counter,
    /// Registry documents loaded
    pub registries_loaded: Counter,
    /// Registry documents or descriptors that failed to load
    pub registry_load_failures: Counter,
}

impl RegistryMetrics {
    /// Create zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_agentlets: self.total_agentlets.get(),
            activation_attempts: self.activation_attempts.get(),
            activation_failures: self.activation_failures.get(),
            registries_loaded: self.registries_loaded.get(),
            registry_load_failures: self.registry_load_failures.get(),
        }
    }

    /// Zero every counter.
    pub fn reset(&self) {
        self.total_agentlets.reset();
        self.activation_attempts.reset();
        self.activation_failures.reset();
        self.registries_loaded.reset();
        self.registry_load_failures.reset();
    }

    /// Export in Prometheus text format.
    pub fn export_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        let rows = [
            ("agentlet_registered_total", "Agentlets registered", snapshot.total_agentlets),
            ("agentlet_activations_total", "Successful activations", snapshot.activation_attempts),
            ("agentlet_activation_failures_total", "Failed activations", snapshot.activation_failures),
            ("agentlet_registries_loaded_total", "Remote registries loaded", snapshot.registries_loaded),
            (
                "agentlet_registry_load_failures_total",
                "Remote registry load failures",
                snapshot.registry_load_failures,
            ),
        ];

        let mut output = String::new();
        for (name, help, value) in rows {
            output.push_str(&format!("# HELP {} {}\n", name, help));
            output.push_str(&format!("# TYPE {} counter\n", name));
            output.push_str(&format!("{} {}\n", name, value));
        }
        output
    }
}

/// Serializable copy of [`RegistryMetrics`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub total_agentlets: u64,
    pub activation_attempts: u64,
    pub activation_failures: u64,
    pub registries_loaded: u64,
    pub registry_load_failures: u64,
}
