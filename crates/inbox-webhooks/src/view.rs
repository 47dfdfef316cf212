use inbox_persist::{Webhook, WebhookFilters};
use serde::{Deserialize, Serialize};

/// Public JSON shape of a webhook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookView {
    pub object: String,
    pub id: String,
    pub namespace: String,
    pub callback_url: String,
    pub failure_notify_url: Option<String>,
    pub include_body: bool,
    pub active: bool,
    pub min_processed_id: i64,
    pub filters: WebhookFilters,
}

impl From<&Webhook> for WebhookView {
    fn from(hook: &Webhook) -> Self {
        Self {
            object: "webhook".to_string(),
            id: hook.id.clone(),
            namespace: hook.namespace_id.clone(),
            callback_url: hook.callback_url.clone(),
            failure_notify_url: hook.failure_notify_url.clone(),
            include_body: hook.include_body,
            active: hook.active,
            min_processed_id: hook.min_processed_id,
            filters: hook.filters.clone(),
        }
    }
}
