use inbox_persist::PersistenceClient;
use inbox_webhooks::WebhookRpc;
use std::sync::Arc;

use crate::config::Config;

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub persist: Arc<dyn PersistenceClient>,
    pub webhooks: Arc<dyn WebhookRpc>,
}

impl AppState {
    pub fn new(
        config: Config,
        persist: Arc<dyn PersistenceClient>,
        webhooks: Arc<dyn WebhookRpc>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            persist,
            webhooks,
        }
    }
}
