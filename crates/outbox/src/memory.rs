use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{EventEnvelope, EventQuery, EventSink, OutboxError, Result};

/// In-memory event sink that records everything it receives.
///
/// Envelopes are kept in publication order. Publication can be made to fail
/// on demand so callers can verify that a broken sink never fails the
/// operation that produced the event.
#[derive(Clone, Default)]
pub struct InMemoryOutbox {
    events: Arc<RwLock<Vec<EventEnvelope>>>,
    fail_on_publish: Arc<AtomicBool>,
}

impl InMemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent publish fail until switched back.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.fail_on_publish.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of recorded envelopes.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Returns every recorded envelope in publication order.
    pub async fn events(&self) -> Vec<EventEnvelope> {
        self.events.read().await.clone()
    }

    /// Returns recorded envelopes matching the query, in publication order.
    pub async fn query(&self, query: &EventQuery) -> Vec<EventEnvelope> {
        let events = self.events.read().await;
        let matching = events.iter().filter(|e| query.matches(e)).cloned();

        let offset = query.offset.unwrap_or(0);
        match query.limit {
            Some(limit) => matching.skip(offset).take(limit).collect(),
            None => matching.skip(offset).collect(),
        }
    }

    /// Returns the types of recorded envelopes, in publication order.
    pub async fn event_types(&self) -> Vec<String> {
        self.events
            .read()
            .await
            .iter()
            .map(|e| e.event_type.clone())
            .collect()
    }

    pub async fn clear(&self) {
        self.events.write().await.clear();
    }
}

#[async_trait]
impl EventSink for InMemoryOutbox {
    async fn publish(&self, envelope: EventEnvelope) -> Result<()> {
        if self.fail_on_publish.load(Ordering::SeqCst) {
            return Err(OutboxError::Rejected {
                event_type: envelope.event_type,
                reason: "sink unavailable".to_string(),
            });
        }
        self.events.write().await.push(envelope);
        Ok(())
    }
}
