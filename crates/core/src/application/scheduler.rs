// Consumer Scheduler - one worker task per enabled queue

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{info, trace};

use crate::application::consumer::QueueConsumer;
use crate::application::events::EventSender;
use crate::domain::QueueConfig;
use crate::error::ConfigError;
use crate::port::{HandlerRegistry, QueueClient};

/// Activates and deactivates the configured [`QueueConsumer`]s.
///
/// Each enabled consumer gets its own worker task, so a slow or blocked
/// queue never starves another queue's polling. Shutdown is best-effort:
/// consumers are disabled without waiting for their loops to observe it.
pub struct ConsumerScheduler {
    consumers: Vec<Arc<QueueConsumer>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl ConsumerScheduler {
    pub fn new(consumers: Vec<Arc<QueueConsumer>>) -> Self {
        Self {
            consumers,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Build consumers from configuration, resolving each label's handler
    /// once before scheduling begins.
    ///
    /// # Errors
    /// - `ConfigError::Invalid` for an unusable queue configuration
    /// - `ConfigError::UnknownHandler` if a label has no registered handler
    pub fn from_configs<F>(
        configs: Vec<QueueConfig>,
        handlers: &HandlerRegistry,
        mut client_for: F,
        events: EventSender,
    ) -> Result<Self, ConfigError>
    where
        F: FnMut(&QueueConfig) -> Arc<dyn QueueClient>,
    {
        let mut consumers = Vec::with_capacity(configs.len());
        for config in configs {
            config.validate()?;
            trace!(label = %config.label, queue = %config.queue_name, "Discovered configuration");

            let handler = handlers.resolve(&config.label)?;
            let client = client_for(&config);
            consumers.push(Arc::new(QueueConsumer::new(
                config,
                client,
                handler,
                events.clone(),
            )));
        }
        Ok(Self::new(consumers))
    }

    pub fn consumers(&self) -> &[Arc<QueueConsumer>] {
        &self.consumers
    }

    /// Spawn one worker task per enabled consumer.
    ///
    /// Consumers with a disabled configuration are skipped entirely: never
    /// started and never counted by the health aggregator.
    pub fn start(&self) {
        trace!("Setting up queue polling");
        let mut handles = self.handles.lock().unwrap();
        for consumer in &self.consumers {
            if consumer.is_enabled() {
                info!(label = %consumer.label(), "Consumer is enabled. Starting");
                let worker = Arc::clone(consumer);
                handles.push(tokio::spawn(async move { worker.run().await }));
            } else {
                info!(label = %consumer.label(), "Consumer is disabled");
            }
        }
    }

    /// Disable every consumer exactly once, without waiting for their loops
    /// to observe the flag.
    pub fn shutdown(&self) {
        info!("Turning off queue polling");
        for consumer in &self.consumers {
            consumer.disable();
        }
    }

    /// Wait for all spawned worker tasks to finish
    pub async fn join(&self) {
        let drained: Vec<JoinHandle<()>> = {
            let mut handles = self.handles.lock().unwrap();
            handles.drain(..).collect()
        };
        for handle in drained {
            let _ = handle.await;
        }
    }
}
