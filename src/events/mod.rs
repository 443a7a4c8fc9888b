//! Events Module
//!
//! Publish/subscribe channel for lifecycle transitions.

pub mod bus;
pub mod event;

pub use bus::{EventBus, EventBusReceiver, TopicReceiver, DEFAULT_CHANNEL_CAPACITY};
pub use event::{EventMetadata, RegistryEvent};
