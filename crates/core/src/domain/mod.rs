// Domain Layer - Pure data types, no I/O

pub mod config;
pub mod event;
pub mod message;

// Re-exports
pub use config::{ConsumerSetConfig, QueueConfig, QueueSettings};
pub use event::{ConsumerEvent, EventKind};
pub use message::Message;
