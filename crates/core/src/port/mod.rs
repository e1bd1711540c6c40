// Port Layer - Interfaces for external dependencies

pub mod handler;
pub mod queue_client;

// Re-exports
pub use handler::{HandlerRegistry, MessageHandler};
pub use queue_client::QueueClient;
