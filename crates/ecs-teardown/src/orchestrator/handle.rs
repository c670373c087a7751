//! Caller-side view of a running teardown

use ecs_teardown_common::TeardownEvent;
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};
use tracing::warn;

/// Receives the lifecycle events of one teardown
///
/// The first handle is subscribed before the pipeline starts and therefore
/// sees every event. The event source closes once the pipeline has emitted
/// its terminal event.
pub struct TeardownHandle {
    receiver: broadcast::Receiver<TeardownEvent>,
}

impl TeardownHandle {
    pub(crate) fn new(receiver: broadcast::Receiver<TeardownEvent>) -> Self {
        Self { receiver }
    }

    /// Next event, or `None` once the teardown has finished and every
    /// event has been received.
    pub async fn next(&mut self) -> Option<TeardownEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Subscriber lagged, teardown events were skipped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Another subscriber, seeing only events emitted from now on
    pub fn subscribe(&self) -> Self {
        Self {
            receiver: self.receiver.resubscribe(),
        }
    }

    /// Convert into a stream of events, ending when the teardown does
    pub fn into_stream(self) -> impl Stream<Item = TeardownEvent> + Send + Unpin + 'static {
        BroadcastStream::new(self.receiver).filter_map(|result| match result {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "Subscriber lagged, teardown events were skipped");
                None
            }
        })
    }

    /// Receive events up to and including the terminal one
    pub async fn collect(mut self) -> Vec<TeardownEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next().await {
            let terminal = event.is_terminal();
            events.push(event);
            if terminal {
                break;
            }
        }
        events
    }
}
