use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub mongodb: MongoDbConfig,
    #[serde(default)]
    pub webhooks: WebhooksConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub mongodb_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for request bodies, file uploads included
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    /// Allowed origins; empty or `*` echoes the request's origin
    #[serde(default)]
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Mongodb,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Create (or reuse) a namespace for this address at startup
    #[serde(default)]
    pub bootstrap_email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoDbConfig {
    pub database: String,
}

impl Default for MongoDbConfig {
    fn default() -> Self {
        Self {
            database: "inbox".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhooksConfig {
    /// External webhook server; hooks are kept in the local store when unset
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default = "default_webhook_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for WebhooksConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            timeout_ms: default_webhook_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

fn default_max_body_bytes() -> usize {
    25 * 1024 * 1024
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_webhook_timeout_ms() -> u64 {
    5000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5555,
                max_body_bytes: default_max_body_bytes(),
                request_timeout_secs: default_request_timeout_secs(),
            },
            cors: CorsConfig {
                enabled: true,
                origins: Vec::new(),
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                bootstrap_email: None,
            },
            mongodb: MongoDbConfig::default(),
            webhooks: WebhooksConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
            mongodb_uri: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables: `INBOX_` prefix, `__` between sections
    ///    (e.g. `INBOX_SERVER__PORT=8080`, `INBOX_STORAGE__BACKEND=mongodb`)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("INBOX")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Secrets from ENV only, and only when the backend needs them
        if cfg.storage.backend == StorageBackend::Mongodb {
            cfg.mongodb_uri = std::env::var("MONGODB_URI").map_err(|_| {
                ConfigError::Message("MONGODB_URI environment variable is required".to_string())
            })?;
        }

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [cors]
            enabled = true
            origins = ["http://localhost:3000"]

            [storage]
            backend = "mongodb"
            bootstrap_email = "dev@example.com"

            [mongodb]
            database = "inbox_test"

            [webhooks]
            server_url = "http://localhost:5000"

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.max_body_bytes, 25 * 1024 * 1024);
        assert_eq!(config.storage.backend, StorageBackend::Mongodb);
        assert_eq!(config.mongodb.database, "inbox_test");
        assert_eq!(config.webhooks.timeout_ms, 5000);
    }

    #[test]
    fn test_optional_sections_default() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            port = 5555

            [cors]
            enabled = false

            [storage]
            backend = "memory"

            [logging]
            level = "info"
            format = "pretty"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.webhooks.server_url.is_none());
        assert_eq!(config.mongodb.database, "inbox");
        assert!(config.storage.bootstrap_email.is_none());
    }
}
