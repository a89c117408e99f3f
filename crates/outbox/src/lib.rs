pub mod channel;
pub mod error;
pub mod event;
pub mod memory;
pub mod query;
pub mod sink;

pub use channel::ChannelEventSink;
pub use common::{AggregateId, EventId};
pub use error::{OutboxError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder};
pub use memory::InMemoryOutbox;
pub use query::EventQuery;
pub use sink::{EventSink, EventSinkExt};
