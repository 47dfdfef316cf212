use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// A stored file: either an attachment of a synced message or an upload
/// waiting to be attached to a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub namespace_id: String,
    pub message_id: Option<String>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub size: usize,
    pub data: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a block
#[derive(Debug, Clone, Default)]
pub struct NewBlock {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub data: Vec<u8>,
}

/// File metadata without the payload, as embedded in messages and drafts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub id: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
    pub message_id: Option<String>,
}

impl Block {
    pub fn from_new(namespace_id: &str, new: NewBlock, message_id: Option<String>) -> Self {
        Self {
            id: crate::public_id::generate(),
            namespace_id: namespace_id.to_string(),
            message_id,
            filename: new.filename,
            content_type: new.content_type,
            content_disposition: new.content_disposition,
            size: new.data.len(),
            data: new.data,
            created_at: Utc::now(),
        }
    }
    
    pub fn to_ref(&self) -> FileRef {
        FileRef {
            id: self.id.clone(),
            filename: self.filename.clone(),
            content_type: self.content_type.clone(),
            size: self.size,
            message_id: self.message_id.clone(),
        }
    }
}
