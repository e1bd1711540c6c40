// Conveyor Core - Domain Logic & Ports
// NO backend dependencies: queue clients live in infra-* crates

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{ConfigError, HandlerError, PollError, Result, TransportError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
