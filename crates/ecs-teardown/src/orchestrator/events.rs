//! Event emission for a running teardown

use ecs_teardown_common::TeardownEvent;
use tokio::sync::broadcast;
use tracing::debug;

/// Sending half of a teardown's event channel
///
/// Cloned into every component that reports progress. Emission never fails:
/// a teardown keeps going even when every subscriber has gone away.
#[derive(Clone)]
pub struct EventSink {
    sender: broadcast::Sender<TeardownEvent>,
}

impl EventSink {
    /// Create a sink with the given channel capacity, returning the first
    /// receiver so no event can be emitted before someone is subscribed.
    pub fn new(capacity: usize) -> (Self, broadcast::Receiver<TeardownEvent>) {
        let (sender, receiver) = broadcast::channel(capacity);
        (Self { sender }, receiver)
    }

    /// Push an event to all current subscribers
    pub fn emit(&self, event: TeardownEvent) {
        debug!(kind = event.kind(), "Emitting teardown event");
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}
