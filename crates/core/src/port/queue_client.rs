// Queue Client Port
// Abstraction over the queue backend (receive + delete)

use async_trait::async_trait;

use crate::domain::Message;
use crate::error::TransportError;

/// Queue backend trait.
///
/// Implementations wrap a concrete queue service (or an in-memory stand-in
/// for tests). Construction and authentication of the underlying client is
/// the implementation's concern; the core only receives and deletes.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Receive up to `max_count` messages, in queue order.
    ///
    /// Returning an empty batch is normal and not an error.
    ///
    /// # Errors
    /// - `TransportError::Receive` / `TransportError::Connection` on backend failure
    async fn receive_batch(&self, max_count: u32) -> Result<Vec<Message>, TransportError>;

    /// Delete a previously received message.
    ///
    /// # Errors
    /// - `TransportError::Delete` if the backend refuses the id/receipt pair
    async fn delete_message(&self, id: &str, receipt: &str) -> Result<(), TransportError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Outcome of one scripted `receive_batch` call
    #[derive(Debug, Clone)]
    pub enum ReceiveOutcome {
        /// Return these messages
        Batch(Vec<Message>),
        /// Fail the receive with this reason
        Fail(String),
    }

    /// Scripted queue client: plays back a sequence of receive outcomes,
    /// then returns empty batches. Records deletions.
    pub struct MockQueueClient {
        script: Arc<Mutex<VecDeque<ReceiveOutcome>>>,
        deleted: Arc<Mutex<Vec<String>>>,
        receive_calls: Arc<Mutex<usize>>,
        fail_deletes: Arc<Mutex<bool>>,
    }

    impl MockQueueClient {
        pub fn new() -> Self {
            Self {
                script: Arc::new(Mutex::new(VecDeque::new())),
                deleted: Arc::new(Mutex::new(Vec::new())),
                receive_calls: Arc::new(Mutex::new(0)),
                fail_deletes: Arc::new(Mutex::new(false)),
            }
        }

        /// Queue a batch to be returned by the next unscripted receive
        pub fn push_batch(&self, messages: Vec<Message>) {
            self.script
                .lock()
                .unwrap()
                .push_back(ReceiveOutcome::Batch(messages));
        }

        /// Queue a receive failure
        pub fn push_failure(&self, reason: impl Into<String>) {
            self.script
                .lock()
                .unwrap()
                .push_back(ReceiveOutcome::Fail(reason.into()));
        }

        /// Make every subsequent delete fail
        pub fn fail_deletes(&self) {
            *self.fail_deletes.lock().unwrap() = true;
        }

        /// Ids of messages deleted so far, in deletion order
        pub fn deleted_ids(&self) -> Vec<String> {
            self.deleted.lock().unwrap().clone()
        }

        pub fn receive_calls(&self) -> usize {
            *self.receive_calls.lock().unwrap()
        }
    }

    impl Default for MockQueueClient {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl QueueClient for MockQueueClient {
        async fn receive_batch(&self, _max_count: u32) -> Result<Vec<Message>, TransportError> {
            *self.receive_calls.lock().unwrap() += 1;

            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(ReceiveOutcome::Batch(messages)) => Ok(messages),
                Some(ReceiveOutcome::Fail(reason)) => Err(TransportError::Receive(reason)),
                None => Ok(Vec::new()),
            }
        }

        async fn delete_message(&self, id: &str, _receipt: &str) -> Result<(), TransportError> {
            if *self.fail_deletes.lock().unwrap() {
                return Err(TransportError::Delete {
                    id: id.to_string(),
                    reason: "mock delete failure".to_string(),
                });
            }
            self.deleted.lock().unwrap().push(id.to_string());
            Ok(())
        }
    }
}
