use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use inbox_api::{
    build_router,
    config::{Config, StorageBackend},
    state::AppState,
};
use inbox_persist::{public_id, MemoryPersistenceClient, PersistenceClient};
use inbox_webhooks::{HttpWebhookClient, LocalWebhookRegistry, WebhookRpc};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting Inbox API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    let persist = connect_storage(&config).await?;

    if let Some(email) = config.storage.bootstrap_email.as_deref() {
        let namespace = match persist.find_namespace_by_email(email).await? {
            Some(existing) => existing,
            None => {
                persist
                    .create_namespace(&public_id::generate(), email, "local")
                    .await?
            }
        };
        tracing::info!(namespace_id = %namespace.id, email = %email, "Namespace ready");
    }

    let webhooks: Arc<dyn WebhookRpc> = match config.webhooks.server_url.as_deref() {
        Some(url) => {
            tracing::info!("Using webhook server at {}", url);
            Arc::new(HttpWebhookClient::new(
                url,
                Duration::from_millis(config.webhooks.timeout_ms),
            )?)
        }
        None => {
            tracing::info!("No webhook server configured, keeping hooks in the local store");
            Arc::new(LocalWebhookRegistry::new(persist.clone()))
        }
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, persist, webhooks));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("API docs: http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn connect_storage(config: &Config) -> anyhow::Result<Arc<dyn PersistenceClient>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory storage");
            Ok(Arc::new(MemoryPersistenceClient::new()))
        }
        #[cfg(feature = "mongodb")]
        StorageBackend::Mongodb => {
            tracing::info!("Connecting to MongoDB");
            let client = inbox_persist::MongoPersistenceClient::connect(
                &config.mongodb_uri,
                &config.mongodb.database,
            )
            .await?;
            tracing::info!("MongoDB connected");
            Ok(Arc::new(client))
        }
        #[cfg(not(feature = "mongodb"))]
        StorageBackend::Mongodb => {
            anyhow::bail!("storage backend `mongodb` requires building with the `mongodb` feature")
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutting down");
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
