use darbar_core::push::{DeviceToken, Notification};
use darbar_core::store::{DocumentStore, Stored};
use darbar_core::CoreResult;
use std::sync::Arc;

use crate::collection::Collection;

pub const NOTIFICATIONS: &str = "notifications";
pub const DEVICE_TOKENS: &str = "userTokens";

#[derive(Clone)]
pub struct NotificationRepository {
    notifications: Collection<Notification>,
    tokens: Collection<DeviceToken>,
}

impl NotificationRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            notifications: Collection::new(store.clone(), NOTIFICATIONS),
            tokens: Collection::new(store, DEVICE_TOKENS),
        }
    }

    pub async fn record(&self, notification: &Notification) -> CoreResult<String> {
        self.notifications.insert(notification).await
    }

    /// Newest first.
    pub async fn feed(&self) -> CoreResult<Vec<Stored<Notification>>> {
        let mut feed = self.notifications.list().await?;
        feed.sort_by(|a, b| b.value.timestamp.cmp(&a.value.timestamp));
        Ok(feed)
    }

    /// Registering the same token twice leaves a single entry.
    pub async fn store_token(&self, token: &str) -> CoreResult<()> {
        self.tokens
            .put(token, &DeviceToken {
                token: token.to_string(),
            })
            .await
    }

    pub async fn tokens(&self) -> CoreResult<Vec<String>> {
        Ok(self
            .tokens
            .list()
            .await?
            .into_iter()
            .map(|stored| stored.value.token)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocumentStore;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_tokens_are_idempotent() {
        let repo = NotificationRepository::new(Arc::new(MemoryDocumentStore::new()));
        repo.store_token("ExponentPushToken-abc").await.unwrap();
        repo.store_token("ExponentPushToken-abc").await.unwrap();
        assert_eq!(repo.tokens().await.unwrap(), vec!["ExponentPushToken-abc".to_string()]);
    }

    #[tokio::test]
    async fn test_feed_is_newest_first() {
        let repo = NotificationRepository::new(Arc::new(MemoryDocumentStore::new()));
        let now = Utc::now();
        for (title, age) in [("old", 2), ("new", 0), ("mid", 1)] {
            repo.record(&Notification {
                title: title.to_string(),
                body: "Fresh biryani".to_string(),
                timestamp: now - Duration::hours(age),
            })
            .await
            .unwrap();
        }
        let titles: Vec<String> = repo.feed().await.unwrap().into_iter().map(|n| n.value.title).collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
    }
}
