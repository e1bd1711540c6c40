// Consumer State-Change Events

/// What happened to a consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// The consumer began polling its queue
    Started,
    /// The consumer was permanently disabled by its circuit breaker
    Stopped,
}

/// Fire-and-forget notification that a consumer changed state.
///
/// The last kind observed per label determines aggregate health membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerEvent {
    pub label: String,
    pub queue_name: String,
    pub kind: EventKind,
}

impl ConsumerEvent {
    pub fn started(label: impl Into<String>, queue_name: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            queue_name: queue_name.into(),
            kind: EventKind::Started,
        }
    }

    pub fn stopped(label: impl Into<String>, queue_name: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            queue_name: queue_name.into(),
            kind: EventKind::Stopped,
        }
    }
}
