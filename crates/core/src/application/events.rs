// Consumer Event Channel
// Explicit message-passing primitive feeding the health aggregator

use tokio::sync::mpsc;
use tracing::trace;

use crate::domain::ConsumerEvent;

/// Publishing side of the event channel, cloned into every consumer worker.
///
/// Publishing is fire-and-forget: events are dropped silently once the
/// receiving side is gone (e.g. during shutdown). All events share a single
/// channel, so one label's events are delivered in emission order.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<ConsumerEvent>,
}

impl EventSender {
    pub fn publish(&self, event: ConsumerEvent) {
        trace!(label = %event.label, kind = ?event.kind, "Publishing consumer event");
        let _ = self.tx.send(event);
    }
}

/// Receiving side, owned by the health aggregator's listener
pub type EventReceiver = mpsc::UnboundedReceiver<ConsumerEvent>;

/// Create the consumer event channel
pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EventKind;

    #[tokio::test]
    async fn events_arrive_in_emission_order() {
        let (tx, mut rx) = event_channel();

        tx.publish(ConsumerEvent::started("a", "queue-a"));
        tx.publish(ConsumerEvent::stopped("a", "queue-a"));

        assert_eq!(rx.recv().await.unwrap().kind, EventKind::Started);
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::Stopped);
    }

    #[tokio::test]
    async fn publish_after_receiver_dropped_is_silent() {
        let (tx, rx) = event_channel();
        drop(rx);

        // Must not panic or error
        tx.publish(ConsumerEvent::started("a", "queue-a"));
    }
}
