use inbox_persist::PersistError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WebhookError {
    /// The webhook server rejected the call (bad parameters, unknown hook)
    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Webhook server unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),
}

impl WebhookError {
    pub fn is_remote(&self) -> bool {
        matches!(self, WebhookError::Remote(_))
    }
}

pub type Result<T> = std::result::Result<T, WebhookError>;
