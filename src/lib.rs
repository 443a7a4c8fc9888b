//! # Agentlet - address-driven module lifecycle engine
//!
//! Lets a host page acquire, activate and retire agentlets (self-contained
//! units of injected behavior) as its address changes, without reloading:
//! - **Registry**: single-active activation protocol with request coalescing
//! - **Loader**: remote module fetching with timeout and retry
//! - **Navigation**: polling plus hooked history signals, debounced
//! - **Events**: broadcast bus announcing every lifecycle transition
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use agentlet::agentlet::{AgentletSpec, BasicAgentlet};
//! use agentlet::navigation::SharedLocation;
//! use agentlet::registry::AgentletRegistry;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> agentlet::Result<()> {
//!     let location = SharedLocation::new("https://example.com/orders");
//!     let registry = AgentletRegistry::new(Arc::new(location.clone()))?;
//!
//!     let orders = BasicAgentlet::new(AgentletSpec::new("orders").with_pattern("example.com/orders"))?;
//!     registry.register(Arc::new(orders)).await?;
//!     registry.start().await;
//!
//!     location.push_state("https://example.com/account");
//!     Ok(())
//! }
//! ```

pub mod agentlet;
pub mod config;
pub mod core;
pub mod events;
pub mod loader;
pub mod monitoring;
pub mod navigation;
pub mod registry;

pub use config::{LoaderConfig, RegistryConfig};
pub use core::error::{Error, Result};
