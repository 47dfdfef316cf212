use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::error::{Result, WebhookError};
use crate::rpc::WebhookRpc;

/// HTTP client for a standalone webhook server
///
/// Endpoints: `POST /hooks`, `POST /hooks/{id}/start`, `POST /hooks/{id}/stop`.
/// Any non-2xx answer is reported as a remote rejection.
pub struct HttpWebhookClient {
    client: Client,
    base_url: String,
}

impl HttpWebhookClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post(&self, path: &str, body: Value) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if status.is_success() {
            tracing::debug!(%url, %status, "Webhook server call succeeded");
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read response body".to_string());
        tracing::warn!(%url, %status, %body, "Webhook server rejected call");
        Err(WebhookError::Remote(format!("{}: {}", status, body)))
    }
}

#[async_trait]
impl WebhookRpc for HttpWebhookClient {
    async fn register_hook(&self, namespace_id: &str, parameters: Value) -> Result<Value> {
        let body = json!({
            "namespace_id": namespace_id,
            "parameters": parameters,
        });
        let response = self.post("/hooks", body).await?;
        Ok(response.json().await?)
    }

    async fn start_hook(&self, webhook_id: &str) -> Result<()> {
        self.post(&format!("/hooks/{}/start", webhook_id), json!({}))
            .await
            .map(|_| ())
    }

    async fn stop_hook(&self, webhook_id: &str) -> Result<()> {
        self.post(&format!("/hooks/{}/stop", webhook_id), json!({}))
            .await
            .map(|_| ())
    }
}
