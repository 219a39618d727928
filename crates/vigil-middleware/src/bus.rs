//! Headless, topic-based publish/subscribe bus for in-process listeners.
//!
//! Uses [`tokio::sync::broadcast`] channels under the hood so that every
//! subscriber receives every event without any single subscriber blocking
//! the others (or the publisher thread).  Sending never blocks, so the bus
//! is usable from plain OS threads.
//!
//! | Topic | Typical traffic |
//! |---|---|
//! | [`Topic::Measurements`] | Every result forwarded by the publisher |
//! | [`Topic::Alerts`] | Out-of-range findings and node-level faults |

use tokio::sync::broadcast;
use tracing::trace;
use vigil_types::{Event, EventPayload, NodeError};

use crate::transport::Transport;

/// Default channel capacity (number of buffered events before old ones are
/// dropped for slow subscribers).
const DEFAULT_CAPACITY: usize = 64;

/// Routing topics of the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Measurements,
    Alerts,
}

impl Topic {
    /// The topic an event belongs to, derived from its payload.
    pub fn for_payload(payload: &EventPayload) -> Self {
        match payload {
            EventPayload::Measurement(_) => Topic::Measurements,
            EventPayload::Alert { .. } => Topic::Alerts,
        }
    }
}

/// Shared event bus.  Clone it cheaply; all clones share the same channels.
#[derive(Clone, Debug)]
pub struct EventBus {
    measurements: broadcast::Sender<Event>,
    alerts: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new bus; `capacity` applies to every topic independently.
    pub fn new(capacity: usize) -> Self {
        let (measurements, _) = broadcast::channel(capacity);
        let (alerts, _) = broadcast::channel(capacity);
        Self {
            measurements,
            alerts,
        }
    }

    /// Publish `event` on `topic`.
    ///
    /// Returns the number of subscribers that were handed the event.
    /// `Ok(0)` when nobody is listening, which is a normal condition.
    pub fn publish_to(&self, topic: Topic, event: Event) -> usize {
        match self.sender(topic).send(event) {
            Ok(n) => n,
            Err(broadcast::error::SendError(_)) => {
                trace!(?topic, "no subscribers on topic");
                0
            }
        }
    }

    /// Subscribe to `topic`.  Only events published after this call are
    /// received.
    pub fn subscribe_to(&self, topic: Topic) -> TopicReceiver {
        TopicReceiver {
            topic,
            receiver: self.sender(topic).subscribe(),
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Measurements => &self.measurements,
            Topic::Alerts => &self.alerts,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// A receiver bound to a single [`Topic`].
pub struct TopicReceiver {
    topic: Topic,
    receiver: broadcast::Receiver<Event>,
}

impl TopicReceiver {
    /// Wait for the next event on this topic.
    ///
    /// `Err(RecvError::Lagged(n))` means `n` events were dropped because the
    /// subscriber fell behind; the caller decides whether to continue.
    pub async fn recv(&mut self) -> Result<Event, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// Non-blocking variant of [`TopicReceiver::recv`], usable from threads.
    pub fn try_recv(&mut self) -> Result<Event, broadcast::error::TryRecvError> {
        self.receiver.try_recv()
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }
}

/// [`Transport`] that forwards every event onto an [`EventBus`], routed by
/// payload.
#[derive(Clone, Debug)]
pub struct BusTransport {
    bus: EventBus,
}

impl BusTransport {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }
}

impl Transport for BusTransport {
    fn name(&self) -> &str {
        "bus"
    }

    fn send(&mut self, event: &Event) -> Result<(), NodeError> {
        let topic = Topic::for_payload(&event.payload);
        self.bus.publish_to(topic, event.clone());
        Ok(())
    }
}
