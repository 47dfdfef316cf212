use async_trait::async_trait;
use inbox_persist::{NewWebhook, PersistError, PersistenceClient, WebhookFilters};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

use crate::error::{Result, WebhookError};
use crate::rpc::WebhookRpc;
use crate::view::WebhookView;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegisterParams {
    callback_url: String,
    #[serde(default)]
    failure_notify_url: Option<String>,
    #[serde(default)]
    include_body: bool,
    #[serde(default = "default_active")]
    active: bool,
    #[serde(default)]
    filters: WebhookFilters,
}

fn default_active() -> bool {
    true
}

/// In-process registry that stores hooks directly through the
/// persistence layer. Used when no external webhook server is configured.
pub struct LocalWebhookRegistry {
    persist: Arc<dyn PersistenceClient>,
}

impl LocalWebhookRegistry {
    pub fn new(persist: Arc<dyn PersistenceClient>) -> Self {
        Self { persist }
    }

    async fn set_active(&self, webhook_id: &str, active: bool) -> Result<()> {
        match self.persist.set_webhook_active(webhook_id, active).await {
            Ok(hook) => {
                tracing::info!(webhook_id = %hook.id, active, "Webhook toggled");
                Ok(())
            }
            Err(PersistError::WebhookNotFound(id)) => {
                Err(WebhookError::Remote(format!("No webhook with id {}", id)))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| WebhookError::Remote(format!("Invalid {}: {}", field, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(WebhookError::Remote(format!(
            "Invalid {}: unsupported scheme {}",
            field, other
        ))),
    }
}

#[async_trait]
impl WebhookRpc for LocalWebhookRegistry {
    async fn register_hook(&self, namespace_id: &str, parameters: Value) -> Result<Value> {
        let params: RegisterParams = serde_json::from_value(parameters)
            .map_err(|e| WebhookError::Remote(format!("Malformed parameters: {}", e)))?;

        validate_url("callback_url", &params.callback_url)?;
        if let Some(ref notify) = params.failure_notify_url {
            validate_url("failure_notify_url", notify)?;
        }

        let hook = self
            .persist
            .create_webhook(
                namespace_id,
                NewWebhook {
                    callback_url: params.callback_url,
                    failure_notify_url: params.failure_notify_url,
                    include_body: params.include_body,
                    active: params.active,
                    filters: params.filters,
                },
            )
            .await?;
        tracing::info!(namespace_id, webhook_id = %hook.id, "Webhook registered");

        serde_json::to_value(WebhookView::from(&hook))
            .map_err(|e| WebhookError::Persist(PersistError::Snapshot(e)))
    }

    async fn start_hook(&self, webhook_id: &str) -> Result<()> {
        self.set_active(webhook_id, true).await
    }

    async fn stop_hook(&self, webhook_id: &str) -> Result<()> {
        self.set_active(webhook_id, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inbox_persist::MemoryPersistenceClient;
    use serde_json::json;

    async fn registry() -> (LocalWebhookRegistry, Arc<dyn PersistenceClient>, String) {
        let persist: Arc<dyn PersistenceClient> = Arc::new(MemoryPersistenceClient::new());
        let ns = persist
            .create_namespace("acct", "hooks@example.com", "gmail")
            .await
            .unwrap();
        (LocalWebhookRegistry::new(persist.clone()), persist, ns.id)
    }

    #[tokio::test]
    async fn test_register_and_toggle() {
        let (registry, persist, ns) = registry().await;

        let created = registry
            .register_hook(
                &ns,
                json!({
                    "callback_url": "https://example.com/hook",
                    "filters": { "from_addr": "alice@example.com" }
                }),
            )
            .await
            .unwrap();
        assert_eq!(created["object"], "webhook");
        assert_eq!(created["active"], true);
        assert_eq!(created["filters"]["from_addr"], "alice@example.com");

        let id = created["id"].as_str().unwrap().to_string();
        registry.stop_hook(&id).await.unwrap();
        let hook = persist.get_webhook(&ns, &id).await.unwrap().unwrap();
        assert!(!hook.active);
    }

    #[tokio::test]
    async fn test_rejects_bad_parameters() {
        let (registry, _, ns) = registry().await;

        for params in [
            json!({}),
            json!({ "callback_url": "ftp://example.com/hook" }),
            json!({ "callback_url": "not a url" }),
            json!({ "callback_url": "https://example.com", "filters": { "nope": 1 } }),
            json!({ "callback_url": "https://example.com", "color": "red" }),
        ] {
            let err = registry.register_hook(&ns, params).await.unwrap_err();
            assert!(err.is_remote(), "unexpected error: {}", err);
        }
    }

    #[tokio::test]
    async fn test_unknown_hook_is_remote_error() {
        let (registry, _, _) = registry().await;
        assert!(registry.start_hook("missing").await.unwrap_err().is_remote());
    }
}
