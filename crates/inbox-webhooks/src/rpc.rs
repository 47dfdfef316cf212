use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Calls into the webhook server.
///
/// Rejections by the server surface as `WebhookError::Remote`; callers
/// map those to client errors and everything else to internal errors.
#[async_trait]
pub trait WebhookRpc: Send + Sync {
    /// Register a hook from raw request parameters; returns the created
    /// hook as JSON
    async fn register_hook(&self, namespace_id: &str, parameters: Value) -> Result<Value>;

    async fn start_hook(&self, webhook_id: &str) -> Result<()>;

    async fn stop_hook(&self, webhook_id: &str) -> Result<()>;
}
