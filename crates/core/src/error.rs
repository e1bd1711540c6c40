// Central Error Types for the Consumer Runtime

use thiserror::Error;

/// Transport-level failures from the queue backend
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("receive failed: {0}")]
    Receive(String),

    #[error("delete failed for message {id}: {reason}")]
    Delete { id: String, reason: String },

    #[error("connection failed: {0}")]
    Connection(String),
}

/// Failure raised by a message handler for an unrecoverable condition
#[derive(Error, Debug)]
#[error("handler rejected payload: {0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// A single poll cycle's failure. The circuit breaker counts these without
/// distinguishing their cause.
#[derive(Error, Debug)]
pub enum PollError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("handler error: {0}")]
    Handler(#[from] HandlerError),

    #[error("handler panicked: {0}")]
    HandlerPanic(String),
}

/// Startup-time configuration and wiring errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("queue {label}: {reason}")]
    Invalid { label: String, reason: String },

    #[error("queue {label}: no handler registered for this label")]
    UnknownHandler { label: String },
}

/// Result type alias for poll-cycle operations
pub type Result<T> = std::result::Result<T, PollError>;
