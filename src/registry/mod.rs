//! Registry Module
//!
//! Orchestrates agentlet lifecycle:
//! - Registration and replacement
//! - Single-active activation protocol
//! - Remote registry documents
//! - In-flight request coalescing

pub mod descriptor;
pub mod guard;
#[allow(clippy::module_inception)]
pub mod registry;

pub use descriptor::{AgentletDescriptor, RegistryDocument};
pub use guard::{InFlight, InFlightGuard};
pub use registry::{ActivationOutcome, AgentletRegistry, ChangeCallback, RegistryBuilder};
