//! Client side of the webhook server.
//!
//! The API never delivers hooks itself; it registers them and toggles
//! them through a [`WebhookRpc`] implementation.

pub mod error;
pub mod http;
pub mod local;
pub mod rpc;
pub mod view;

pub use error::WebhookError;
pub use http::HttpWebhookClient;
pub use local::LocalWebhookRegistry;
pub use rpc::WebhookRpc;
pub use view::WebhookView;
