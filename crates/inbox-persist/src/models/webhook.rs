use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Webhook {
    pub id: String,
    pub namespace_id: String,
    pub callback_url: String,
    pub failure_notify_url: Option<String>,
    pub include_body: bool,
    pub active: bool,
    /// Sync log position the hook starts delivering after
    pub min_processed_id: i64,
    pub filters: WebhookFilters,
    pub created_at: DateTime<Utc>,
}

/// Restricts which messages a hook fires for
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cc_addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bcc_addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_before: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_after: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_before: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_after: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewWebhook {
    pub callback_url: String,
    pub failure_notify_url: Option<String>,
    pub include_body: bool,
    pub active: bool,
    pub filters: WebhookFilters,
}
