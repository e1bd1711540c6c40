// Message Handler Port
// User-supplied business logic invoked per de-queued message

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{ConfigError, HandlerError};

/// Per-queue message handler.
///
/// Called with the parsed payload of each de-queued message (base64-decoded
/// when possible). A de-queued message is only deleted if `handle` returns
/// `Ok`; returning an error keeps the message on the queue for redelivery.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// # Errors
    /// - `HandlerError` on any unrecoverable condition, to prevent deletion
    async fn handle(&self, payload: &str) -> Result<(), HandlerError>;
}

/// Explicit `label -> handler` mapping, populated at startup before
/// scheduling begins.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn MessageHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, label: impl Into<String>, handler: Arc<dyn MessageHandler>) {
        self.handlers.insert(label.into(), handler);
    }

    /// # Errors
    /// - `ConfigError::UnknownHandler` if no handler was registered for the label
    pub fn resolve(&self, label: &str) -> Result<Arc<dyn MessageHandler>, ConfigError> {
        self.handlers
            .get(label)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownHandler {
                label: label.to_string(),
            })
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock handler behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Always succeed
        Succeed,
        /// Always fail with message
        Fail(String),
        /// Panic with message (for panic isolation testing)
        Panic(String),
        /// Succeed for the first N calls, fail afterwards
        FailAfter(usize),
    }

    /// Mock handler recording every payload it sees
    pub struct MockHandler {
        behavior: MockBehavior,
        handled: Arc<Mutex<Vec<String>>>,
        call_count: Arc<Mutex<usize>>,
    }

    impl MockHandler {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior,
                handled: Arc::new(Mutex::new(Vec::new())),
                call_count: Arc::new(Mutex::new(0)),
            }
        }

        pub fn new_success() -> Self {
            Self::new(MockBehavior::Succeed)
        }

        pub fn new_fail(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Fail(message.into()))
        }

        pub fn new_panic_inducing(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Panic(message.into()))
        }

        /// Payloads successfully received by `handle`, in call order
        pub fn handled_payloads(&self) -> Vec<String> {
            self.handled.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl MessageHandler for MockHandler {
        async fn handle(&self, payload: &str) -> Result<(), HandlerError> {
            let calls = {
                let mut count = self.call_count.lock().unwrap();
                *count += 1;
                *count
            };
            self.handled.lock().unwrap().push(payload.to_string());

            match &self.behavior {
                MockBehavior::Succeed => Ok(()),
                MockBehavior::Fail(message) => Err(HandlerError::new(message.clone())),
                MockBehavior::Panic(message) => panic!("{}", message),
                MockBehavior::FailAfter(n) => {
                    if calls > *n {
                        Err(HandlerError::new(format!("failing after {} calls", n)))
                    } else {
                        Ok(())
                    }
                }
            }
        }
    }
}
