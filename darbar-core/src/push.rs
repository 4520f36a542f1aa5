use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
}

/// Delivery receipt for one device token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushReceipt {
    pub id: String,
    pub token: String,
}

/// A broadcast that was sent, kept for the in-app notification feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

/// A registered device, stored under its own token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceToken {
    pub token: String,
}

#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Deliver `message` to every token, one receipt per token.
    async fn send(&self, message: &PushMessage, tokens: &[String]) -> CoreResult<Vec<PushReceipt>>;
}

/// Records pushes instead of delivering them.
#[derive(Default)]
pub struct MockPushGateway {
    sent: Mutex<Vec<(PushMessage, Vec<String>)>>,
}

impl MockPushGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(PushMessage, Vec<String>)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PushGateway for MockPushGateway {
    async fn send(&self, message: &PushMessage, tokens: &[String]) -> CoreResult<Vec<PushReceipt>> {
        tracing::info!("Mock push '{}' to {} device(s)", message.title, tokens.len());

        let mut sent = self
            .sent
            .lock()
            .map_err(|_| CoreError::InternalError("push log poisoned".to_string()))?;
        sent.push((message.clone(), tokens.to_vec()));

        Ok(tokens
            .iter()
            .enumerate()
            .map(|(i, token)| PushReceipt {
                id: format!("mock-push-{}-{}", sent.len(), i),
                token: token.clone(),
            })
            .collect())
    }
}
