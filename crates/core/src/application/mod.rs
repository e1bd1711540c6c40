// Application Layer - Consumer runtime logic

pub mod consumer;
pub mod events;
pub mod health;
pub mod scheduler;

// Re-exports
pub use consumer::QueueConsumer;
pub use events::{event_channel, EventReceiver, EventSender};
pub use health::{HealthAggregator, HealthReport, HealthStatus};
pub use scheduler::ConsumerScheduler;
