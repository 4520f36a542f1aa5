use async_trait::async_trait;
use darbar_core::push::{PushGateway, PushMessage, PushReceipt};
use darbar_core::{CoreError, CoreResult};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

const SERVICE: &str = "Pushy";

/// Broadcast pushes through the Pushy REST API.
pub struct PushyGateway {
    api_key: String,
    url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct PushyResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    id: String,
    #[serde(default)]
    error: Option<String>,
}

impl PushyGateway {
    pub fn new(api_key: String, url: String) -> Self {
        Self {
            api_key,
            url: url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

pub fn push_payload(message: &PushMessage, tokens: &[String]) -> Value {
    json!({
        "to": tokens,
        "data": { "title": message.title, "message": message.body },
        "notification": { "title": message.title, "body": message.body, "sound": "default" }
    })
}

#[async_trait]
impl PushGateway for PushyGateway {
    async fn send(&self, message: &PushMessage, tokens: &[String]) -> CoreResult<Vec<PushReceipt>> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(format!("{}/push", self.url))
            .query(&[("api_key", &self.api_key)])
            .json(&push_payload(message, tokens))
            .send()
            .await
            .map_err(|e| {
                error!("Pushy request failed: {}", e);
                CoreError::gateway(SERVICE, "Push service unavailable")
            })?;

        let status = response.status();
        let body: PushyResponse = response
            .json()
            .await
            .map_err(|e| CoreError::gateway(SERVICE, format!("Bad response format: {}", e)))?;

        if !status.is_success() || !body.success {
            let reason = body.error.unwrap_or_else(|| format!("HTTP {}", status));
            error!("Pushy rejected push: {}", reason);
            return Err(CoreError::gateway(SERVICE, reason));
        }

        info!("Push {} accepted for {} device(s)", body.id, tokens.len());
        Ok(tokens
            .iter()
            .map(|token| PushReceipt {
                id: body.id.clone(),
                token: token.clone(),
            })
            .collect())
    }
}
