//! Monitoring Module
//!
//! Provides observability for the engine:
//! - Registry counters
//! - Structured logging

pub mod logging;
pub mod metrics;

pub use logging::{init_tracing, LogFormat, LogLevel, LoggingConfig};
pub use metrics::{Counter, MetricsSnapshot, RegistryMetrics};
