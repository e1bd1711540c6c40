// Queue Consumer - poll/process/delete loop with a failure circuit breaker

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use tokio::time::sleep;
use tracing::{error, info, trace};

use crate::application::events::EventSender;
use crate::domain::{ConsumerEvent, Message, QueueConfig};
use crate::error::PollError;
use crate::port::{MessageHandler, QueueClient};

/// Owns one queue's poll cycle.
///
/// Repeatedly receives a batch, invokes the handler per message in receive
/// order, and deletes each message immediately after it is handled
/// successfully (at-least-once: a crash between handling and deletion leaves
/// the message for redelivery). Any failure in a cycle halts the remainder of
/// the batch and feeds the consecutive-failure circuit breaker; reaching the
/// threshold disables the consumer permanently.
pub struct QueueConsumer {
    config: QueueConfig,
    enabled: AtomicBool,
    consecutive_failures: AtomicU32,
    client: Arc<dyn QueueClient>,
    handler: Arc<dyn MessageHandler>,
    events: EventSender,
}

impl QueueConsumer {
    pub fn new(
        config: QueueConfig,
        client: Arc<dyn QueueClient>,
        handler: Arc<dyn MessageHandler>,
        events: EventSender,
    ) -> Self {
        let enabled = config.enabled;
        Self {
            config,
            enabled: AtomicBool::new(enabled),
            consecutive_failures: AtomicU32::new(0),
            client,
            handler,
            events,
        }
    }

    pub fn label(&self) -> &str {
        &self.config.label
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::SeqCst)
    }

    /// Stop polling without emitting an event (e.g. on process shutdown).
    ///
    /// Cooperative: the loop only observes the flag at the top of an
    /// iteration, so cessation latency is bounded by the longer of the
    /// current sleep and one batch's processing time.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    /// Run the poll loop until the consumer is disabled.
    ///
    /// A consumer whose configuration is disabled does nothing: no event is
    /// emitted and it never appears in health aggregation.
    pub async fn run(&self) {
        if !self.is_enabled() {
            info!(label = %self.config.label, "Queue polling is disabled");
            return;
        }

        info!(
            label = %self.config.label,
            queue = %self.config.queue_name,
            "Queue polling is active"
        );
        self.events
            .publish(ConsumerEvent::started(&self.config.label, &self.config.queue_name));

        while self.is_enabled() {
            trace!(
                label = %self.config.label,
                batch_size = self.config.batch_size,
                "Polling next messages"
            );

            match self.poll_cycle().await {
                Ok(count) => {
                    self.consecutive_failures.store(0, Ordering::SeqCst);
                    trace!(label = %self.config.label, polled = count, "Poll cycle completed");
                    sleep(self.config.poll_interval()).await;
                }
                Err(err) => {
                    let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                    error!(
                        label = %self.config.label,
                        error = %err,
                        consecutive_failures = failures,
                        "An error occurred during polling"
                    );

                    // We do not wish to overly stress the queue backend
                    if failures >= self.config.max_consecutive_failures {
                        error!(
                            label = %self.config.label,
                            "Reached max number of consecutive failures. Disabling"
                        );
                        self.enabled.store(false, Ordering::SeqCst);
                        self.events.publish(ConsumerEvent::stopped(
                            &self.config.label,
                            &self.config.queue_name,
                        ));
                    } else {
                        info!(
                            label = %self.config.label,
                            backoff_secs = self.config.failure_backoff_secs,
                            "Pausing before polling again"
                        );
                        sleep(self.config.failure_backoff()).await;
                    }
                }
            }
        }

        info!(label = %self.config.label, "Queue polling stopped");
    }

    /// One poll cycle: receive a batch and process each message in order.
    ///
    /// Halts on the first failure; messages deleted earlier in the batch stay
    /// deleted, the failing message and everything after it stay on the queue.
    pub(crate) async fn poll_cycle(&self) -> Result<usize, PollError> {
        let messages = self.client.receive_batch(self.config.batch_size).await?;
        let count = messages.len();

        for message in messages {
            self.process_message(message).await?;
        }
        Ok(count)
    }

    async fn process_message(&self, message: Message) -> Result<(), PollError> {
        trace!(label = %self.config.label, id = %message.id, "Received message");

        let payload = message.handler_payload();
        let handler = Arc::clone(&self.handler);

        // A panicking handler must not kill the worker task silently, so the
        // invocation runs in its own task and the JoinError is inspected.
        let invocation = tokio::task::spawn(async move { handler.handle(&payload).await });

        match invocation.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(err.into()),
            Err(join_err) => {
                if join_err.is_panic() {
                    error!(label = %self.config.label, id = %message.id, "Handler panicked");
                } else {
                    error!(label = %self.config.label, id = %message.id, "Handler was cancelled");
                }
                return Err(PollError::HandlerPanic(join_err.to_string()));
            }
        }

        trace!(
            label = %self.config.label,
            id = %message.id,
            "Deleting successfully de-queued message"
        );
        self.client
            .delete_message(&message.id, &message.receipt)
            .await?;
        Ok(())
    }
}
