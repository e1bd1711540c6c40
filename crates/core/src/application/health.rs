// Health Aggregation for the liveness probe

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::application::events::EventReceiver;
use crate::domain::{ConsumerEvent, EventKind};

/// Aggregate health of the queue polling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    #[serde(rename = "UP")]
    Up,
    #[serde(rename = "DOWN")]
    Down,
}

/// Snapshot answered to a health-probe caller.
///
/// `DOWN` as soon as any queue has been disabled by its circuit breaker,
/// which lets an orchestrator restart the process.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub started: Vec<String>,
    pub stopped: Vec<String>,
}

impl HealthReport {
    pub fn is_up(&self) -> bool {
        self.status == HealthStatus::Up
    }
}

#[derive(Default)]
struct HealthState {
    started: BTreeSet<String>,
    stopped: BTreeSet<String>,
}

/// Consumes consumer state-change events and answers health queries.
///
/// Cheap to clone; all clones share the same state. Mutation happens under a
/// single lock since many consumer workers publish concurrently.
#[derive(Clone, Default)]
pub struct HealthAggregator {
    state: Arc<Mutex<HealthState>>,
}

impl HealthAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the listener task draining the event channel.
    ///
    /// Runs until every [`EventSender`](crate::application::events::EventSender)
    /// clone has been dropped.
    pub fn spawn_listener(&self, mut rx: EventReceiver) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                Self::apply(&state, event);
            }
            debug!("Consumer event channel closed, health listener exiting");
        })
    }

    /// Apply a single event directly (the listener task calls this)
    pub fn observe(&self, event: ConsumerEvent) {
        Self::apply(&self.state, event);
    }

    fn apply(state: &Mutex<HealthState>, event: ConsumerEvent) {
        debug!(label = %event.label, kind = ?event.kind, "Consumer state change");
        let mut state = state.lock().unwrap();
        match event.kind {
            EventKind::Started => {
                state.started.insert(event.label);
            }
            EventKind::Stopped => {
                state.started.remove(&event.label);
                state.stopped.insert(event.label);
            }
        }
    }

    /// Current aggregate status: `DOWN` iff any queue has stopped
    pub fn report(&self) -> HealthReport {
        let state = self.state.lock().unwrap();
        let status = if state.stopped.is_empty() {
            HealthStatus::Up
        } else {
            HealthStatus::Down
        };
        HealthReport {
            status,
            started: state.started.iter().cloned().collect(),
            stopped: state.stopped.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::event_channel;

    #[test]
    fn empty_aggregator_is_up() {
        let aggregator = HealthAggregator::new();
        let report = aggregator.report();
        assert!(report.is_up());
        assert!(report.started.is_empty());
        assert!(report.stopped.is_empty());
    }

    #[test]
    fn started_queues_keep_status_up() {
        let aggregator = HealthAggregator::new();
        aggregator.observe(ConsumerEvent::started("a", "queue-a"));
        aggregator.observe(ConsumerEvent::started("b", "queue-b"));

        let report = aggregator.report();
        assert!(report.is_up());
        assert_eq!(report.started, vec!["a", "b"]);
    }

    #[test]
    fn stopped_queue_flips_status_down_and_latches() {
        let aggregator = HealthAggregator::new();
        aggregator.observe(ConsumerEvent::started("a", "queue-a"));
        aggregator.observe(ConsumerEvent::started("b", "queue-b"));
        aggregator.observe(ConsumerEvent::stopped("a", "queue-a"));

        let report = aggregator.report();
        assert_eq!(report.status, HealthStatus::Down);
        assert_eq!(report.started, vec!["b"]);
        assert_eq!(report.stopped, vec!["a"]);

        // Another queue starting later does not clear DOWN
        aggregator.observe(ConsumerEvent::started("c", "queue-c"));
        assert_eq!(aggregator.report().status, HealthStatus::Down);
    }

    #[test]
    fn duplicate_stopped_events_do_not_duplicate_entries() {
        let aggregator = HealthAggregator::new();
        aggregator.observe(ConsumerEvent::started("a", "queue-a"));
        aggregator.observe(ConsumerEvent::stopped("a", "queue-a"));
        aggregator.observe(ConsumerEvent::stopped("a", "queue-a"));

        assert_eq!(aggregator.report().stopped, vec!["a"]);
    }

    #[test]
    fn report_serializes_with_uppercase_status() {
        let aggregator = HealthAggregator::new();
        aggregator.observe(ConsumerEvent::started("a", "queue-a"));

        let json = serde_json::to_value(aggregator.report()).unwrap();
        assert_eq!(json["status"], "UP");
        assert_eq!(json["started"][0], "a");
    }

    #[tokio::test]
    async fn listener_drains_the_event_channel() {
        let (tx, rx) = event_channel();
        let aggregator = HealthAggregator::new();
        let listener = aggregator.spawn_listener(rx);

        tx.publish(ConsumerEvent::started("a", "queue-a"));
        tx.publish(ConsumerEvent::stopped("a", "queue-a"));
        drop(tx);

        listener.await.unwrap();

        let report = aggregator.report();
        assert_eq!(report.status, HealthStatus::Down);
        assert_eq!(report.stopped, vec!["a"]);
    }
}
