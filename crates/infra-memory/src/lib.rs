// In-memory queue backend
// Reference implementation of the QueueClient port, used by integration
// tests and for embedding without a real queue service.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use conveyor_core::domain::Message;
use conveyor_core::error::TransportError;
use conveyor_core::port::QueueClient;

struct Stored {
    id: String,
    payload: String,
}

#[derive(Default)]
struct QueueState {
    /// Messages waiting to be received, in enqueue order
    pending: VecDeque<Stored>,
    /// Received but not yet deleted: id -> receipt
    in_flight: HashMap<String, String>,
    /// Receive failures still to be injected
    receive_failures: usize,
    delete_failures: bool,
}

/// FIFO queue held in memory.
///
/// Receiving moves messages into an in-flight set with a fresh receipt;
/// deleting requires the matching id/receipt pair. There is no visibility
/// timeout: an undeleted in-flight message is not redelivered.
///
/// Cheap to clone; all clones share the same queue.
#[derive(Clone, Default)]
pub struct InMemoryQueueClient {
    state: Arc<Mutex<QueueState>>,
}

impl InMemoryQueueClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a payload, returning the assigned message id
    pub fn push(&self, payload: impl Into<String>) -> String {
        let id = Uuid::new_v4().to_string();
        let mut state = self.state.lock().unwrap();
        state.pending.push_back(Stored {
            id: id.clone(),
            payload: payload.into(),
        });
        id
    }

    /// Inject `count` receive failures before receives succeed again
    pub fn fail_next_receives(&self, count: usize) {
        self.state.lock().unwrap().receive_failures = count;
    }

    /// Toggle failure of every delete call
    pub fn set_delete_failures(&self, failing: bool) {
        self.state.lock().unwrap().delete_failures = failing;
    }

    /// Messages still waiting to be received
    pub fn pending_count(&self) -> usize {
        self.state.lock().unwrap().pending.len()
    }

    /// Messages received but not yet deleted
    pub fn in_flight_count(&self) -> usize {
        self.state.lock().unwrap().in_flight.len()
    }
}

#[async_trait]
impl QueueClient for InMemoryQueueClient {
    async fn receive_batch(&self, max_count: u32) -> Result<Vec<Message>, TransportError> {
        let mut state = self.state.lock().unwrap();

        if state.receive_failures > 0 {
            state.receive_failures -= 1;
            return Err(TransportError::Receive(
                "injected receive failure".to_string(),
            ));
        }

        let mut batch = Vec::new();
        while batch.len() < max_count as usize {
            let Some(stored) = state.pending.pop_front() else {
                break;
            };
            let receipt = Uuid::new_v4().to_string();
            state.in_flight.insert(stored.id.clone(), receipt.clone());
            batch.push(Message::new(stored.id, receipt, stored.payload));
        }

        debug!(received = batch.len(), "Received batch from in-memory queue");
        Ok(batch)
    }

    async fn delete_message(&self, id: &str, receipt: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();

        if state.delete_failures {
            return Err(TransportError::Delete {
                id: id.to_string(),
                reason: "injected delete failure".to_string(),
            });
        }

        match state.in_flight.get(id) {
            Some(stored_receipt) if stored_receipt == receipt => {
                state.in_flight.remove(id);
                Ok(())
            }
            Some(_) => Err(TransportError::Delete {
                id: id.to_string(),
                reason: "receipt does not match".to_string(),
            }),
            None => Err(TransportError::Delete {
                id: id.to_string(),
                reason: "message is not in flight".to_string(),
            }),
        }
    }
}
