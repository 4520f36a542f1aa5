use darbar_core::store::{DocumentStore, Stored};
use darbar_core::CoreResult;
use darbar_shared::models::events::AuditEvent;
use std::sync::Arc;
use tracing::{error, info};

use crate::collection::Collection;

pub const EVENTS: &str = "events";

/// Append-only audit trail kept next to the documents it describes.
///
/// Recording never fails the caller: the state change has already
/// happened by the time an event is written.
#[derive(Clone)]
pub struct EventLog {
    events: Collection<AuditEvent>,
}

impl EventLog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            events: Collection::new(store, EVENTS),
        }
    }

    pub async fn record(&self, event: AuditEvent) {
        match self.events.insert(&event).await {
            Ok(id) => info!("Recorded {} event {}", event.name(), id),
            Err(e) => error!("Failed to record {} event: {}", event.name(), e),
        }
    }

    pub async fn list(&self) -> CoreResult<Vec<Stored<AuditEvent>>> {
        self.events.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocumentStore;
    use darbar_shared::models::events::{unix_now, GoldPriceChangedEvent};

    #[tokio::test]
    async fn test_record_event() {
        let log = EventLog::new(Arc::new(MemoryDocumentStore::new()));
        log.record(AuditEvent::GoldPriceChanged(GoldPriceChangedEvent {
            percent: 90.0,
            dishes_repriced: 12,
            scope: None,
            timestamp: unix_now(),
        }))
        .await;

        let events = log.list().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].value.name(), "GOLD_PRICE_CHANGED");
    }
}
