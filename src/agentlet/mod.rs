//! Agentlet Module
//!
//! Defines the unit of page-augmenting behavior:
//! - Agentlet interface
//! - Address patterns
//! - Validated construction

pub mod basic;
pub mod interface;
pub mod pattern;

pub use basic::{AgentletSpec, BasicAgentlet};
pub use interface::{ActivationContext, Agentlet, AgentletError, AgentletMetadata, AgentletResult};
pub use pattern::{Pattern, PatternKind, PatternSet};
