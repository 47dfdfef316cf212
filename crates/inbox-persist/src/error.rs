use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[cfg(feature = "mongodb")]
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),
    
    #[cfg(feature = "mongodb")]
    #[error("BSON serialization error: {0}")]
    BsonSerialization(#[from] bson::ser::Error),
    
    #[cfg(feature = "mongodb")]
    #[error("BSON deserialization error: {0}")]
    BsonDeserialization(#[from] bson::de::Error),
    
    #[error("Snapshot serialization error: {0}")]
    Snapshot(#[from] serde_json::Error),
    
    #[error("Namespace not found: {0}")]
    NamespaceNotFound(String),
    
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),
    
    #[error("Message not found: {0}")]
    MessageNotFound(String),
    
    #[error("Draft not found: {0}")]
    DraftNotFound(String),
    
    #[error("Webhook not found: {0}")]
    WebhookNotFound(String),
    
    #[error("Tag name not available: {0}")]
    TagNameUnavailable(String),
    
    #[error("Draft {draft_id} has already been updated to {latest_id}")]
    DraftConflict { draft_id: String, latest_id: String },
    
    #[error("Message with public id {0} is not a draft")]
    NotADraft(String),
    
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
    
    #[error("Invalid stamp: {0}")]
    InvalidStamp(String),
    
    #[error("Connection error: {0}")]
    Connection(String),
    
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PersistError>;
