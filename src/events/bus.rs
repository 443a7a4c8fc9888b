//! Broadcast event bus.
//!
//! Every component announces transitions here instead of holding
//! references to the components that react to them.

use crate::events::event::{EventMetadata, RegistryEvent};
use tokio::sync::broadcast;

/// Default channel capacity for the event bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Publish/subscribe channel for [`RegistryEvent`]s.
///
/// Cloning yields another handle to the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<(RegistryEvent, EventMetadata)>,
}

impl EventBus {
    /// Create a new event bus with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with the specified capacity.
    ///
    /// The capacity bounds how many events are buffered for slow subscribers.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Publish an event from the registry.
    ///
    /// Returns `true` if at least one subscriber received it.
    pub fn publish(&self, event: RegistryEvent) -> bool {
        self.publish_with_source(event, "registry")
    }

    /// Publish an event with a custom source.
    pub fn publish_with_source(&self, event: RegistryEvent, source: impl Into<String>) -> bool {
        self.tx.send((event, EventMetadata::new(source))).is_ok()
    }

    /// Subscribe to all events published after this call.
    pub fn subscribe(&self) -> EventBusReceiver {
        EventBusReceiver {
            rx: self.tx.subscribe(),
        }
    }

    /// Subscribe to a fixed set of topics.
    pub fn subscribe_topics(&self, topics: &[&str]) -> TopicReceiver {
        TopicReceiver {
            rx: self.tx.subscribe(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver for all events.
pub struct EventBusReceiver {
    rx: broadcast::Receiver<(RegistryEvent, EventMetadata)>,
}

impl EventBusReceiver {
    /// Receive the next event. `None` once the bus is closed.
    pub async fn recv(&mut self) -> Option<(RegistryEvent, EventMetadata)> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Receive without waiting.
    pub fn try_recv(&mut self) -> Option<(RegistryEvent, EventMetadata)> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }

    /// Take every event currently buffered.
    pub fn drain(&mut self) -> Vec<RegistryEvent> {
        std::iter::from_fn(|| self.try_recv().map(|(event, _)| event)).collect()
    }
}

/// Receiver that only yields events on selected topics.
pub struct TopicReceiver {
    rx: broadcast::Receiver<(RegistryEvent, EventMetadata)>,
    topics: Vec<String>,
}

impl TopicReceiver {
    fn wanted(&self, event: &RegistryEvent) -> bool {
        self.topics.iter().any(|t| t == event.topic())
    }

    /// Receive the next matching event. `None` once the bus is closed.
    pub async fn recv(&mut self) -> Option<(RegistryEvent, EventMetadata)> {
        loop {
            match self.rx.recv().await {
                Ok((event, meta)) if self.wanted(&event) => return Some((event, meta)),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Receive a matching event without waiting.
    pub fn try_recv(&mut self) -> Option<(RegistryEvent, EventMetadata)> {
        loop {
            match self.rx.try_recv() {
                Ok((event, meta)) if self.wanted(&event) => return Some((event, meta)),
                Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
