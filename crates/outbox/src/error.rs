use thiserror::Error;

/// Errors raised while handing an event to a sink.
#[derive(Debug, Error)]
pub enum OutboxError {
    /// The envelope could not be built from a domain event.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An envelope was built without one of its required fields.
    #[error("Event envelope is missing {0}")]
    MissingField(&'static str),

    /// The consumer side of a channel sink has gone away.
    #[error("Event channel closed")]
    ChannelClosed,

    /// The channel sink is at capacity and the event was not accepted.
    #[error("Event channel full, dropped {event_type}")]
    ChannelFull { event_type: String },

    /// The sink rejected the event.
    #[error("Event sink rejected {event_type}: {reason}")]
    Rejected { event_type: String, reason: String },
}

/// Result type for outbox operations.
pub type Result<T> = std::result::Result<T, OutboxError>;
