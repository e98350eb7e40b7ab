//! In-process fan-out of pipeline events.
//!
//! The router publishes every snapshot, source signal, decision and
//! execution report; the journal and any API observers subscribe.

use tokio::sync::broadcast;
use tracing::trace;

use crate::constants::runtime::BUS_CAPACITY;
use crate::events::Event;

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(BUS_CAPACITY)
    }
}

impl EventBus {
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Fails only when nobody is subscribed.
    pub fn publish(&self, event: Event) -> Result<usize, broadcast::error::SendError<Event>> {
        self.tx.send(event)
    }

    /// Publish without caring whether anyone is listening.
    pub fn emit(&self, event: Event) {
        if let Err(broadcast::error::SendError(event)) = self.tx.send(event) {
            trace!("[BUS] No subscribers for {}", event.kind());
        }
    }
}
