// Per-queue configuration

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Amount of messages to poll each cycle
pub const DEFAULT_BATCH_SIZE: u32 = 10;

/// How long to wait between successful poll cycles
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Amount of consecutive failed cycles before a queue is disabled,
/// to prevent hammering the backend
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 10;

/// How long to wait after a failed poll cycle before retrying
pub const DEFAULT_FAILURE_BACKOFF_SECS: u64 = 30;

/// Configuration of a single queue consumer.
///
/// Immutable after startup. The `enabled` flag is only the *initial* state:
/// the consumer copies it into its own runtime flag, which the circuit
/// breaker or an external `disable()` call may later flip.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Symbolic name distinguishing this consumer from the others
    pub label: String,
    /// Name of the queue at the backend
    pub queue_name: String,
    /// Whether this queue should be polled at all
    pub enabled: bool,
    pub batch_size: u32,
    pub poll_interval_secs: u64,
    pub failure_backoff_secs: u64,
    pub max_consecutive_failures: u32,
}

impl QueueConfig {
    /// Create an enabled config with default polling parameters
    pub fn new(label: impl Into<String>, queue_name: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            queue_name: queue_name.into(),
            enabled: true,
            batch_size: DEFAULT_BATCH_SIZE,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            failure_backoff_secs: DEFAULT_FAILURE_BACKOFF_SECS,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn failure_backoff(&self) -> Duration {
        Duration::from_secs(self.failure_backoff_secs)
    }

    /// Reject configurations that cannot be polled sensibly
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                label: self.label.clone(),
                reason: "queue_name must not be blank".to_string(),
            });
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid {
                label: self.label.clone(),
                reason: "batch_size must be at least 1".to_string(),
            });
        }
        if self.max_consecutive_failures == 0 {
            return Err(ConfigError::Invalid {
                label: self.label.clone(),
                reason: "max_consecutive_failures must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Deserializable settings for one queue, without its label.
///
/// Queues arrive as a dictionary keyed by label (`queues.<label>.…`), so the
/// label lives in the map key and is attached by [`ConsumerSetConfig`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueSettings {
    pub queue_name: String,
    /// Queues must opt in to polling
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_failure_backoff_secs")]
    pub failure_backoff_secs: u64,
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
}

fn default_batch_size() -> u32 {
    DEFAULT_BATCH_SIZE
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_failure_backoff_secs() -> u64 {
    DEFAULT_FAILURE_BACKOFF_SECS
}

fn default_max_consecutive_failures() -> u32 {
    DEFAULT_MAX_CONSECUTIVE_FAILURES
}

/// The full set of configured queues, keyed by label
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ConsumerSetConfig {
    pub queues: BTreeMap<String, QueueSettings>,
}

impl ConsumerSetConfig {
    /// Flatten the label-keyed map into per-queue configs
    pub fn into_configs(self) -> Vec<QueueConfig> {
        self.queues
            .into_iter()
            .map(|(label, settings)| QueueConfig {
                label,
                queue_name: settings.queue_name,
                enabled: settings.enabled,
                batch_size: settings.batch_size,
                poll_interval_secs: settings.poll_interval_secs,
                failure_backoff_secs: settings.failure_backoff_secs,
                max_consecutive_failures: settings.max_consecutive_failures,
            })
            .collect()
    }
}
