use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Stamp meaning "before the first transaction"
pub const START_STAMP: &str = "0";

// Object types recorded in the sync log
pub const OBJECT_NAMESPACE: &str = "namespace";
pub const OBJECT_TAG: &str = "tag";
pub const OBJECT_THREAD: &str = "thread";
pub const OBJECT_MESSAGE: &str = "message";
pub const OBJECT_CONTACT: &str = "contact";
pub const OBJECT_FILE: &str = "file";
pub const OBJECT_WEBHOOK: &str = "webhook";
pub const OBJECT_DRAFT: &str = "draft";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnCommand {
    Insert,
    Update,
    Delete,
}

impl TxnCommand {
    /// Event name exposed to syncing clients
    pub fn event_name(&self) -> &'static str {
        match self {
            TxnCommand::Insert => "create",
            TxnCommand::Update => "modify",
            TxnCommand::Delete => "delete",
        }
    }
}

/// One entry of the per-namespace change log that backs client sync.
/// Its public id doubles as the sync stamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub seq: i64,
    pub id: String,
    pub namespace_id: String,
    pub object_type: String,
    pub object_id: String,
    pub command: TxnCommand,
    pub snapshot: serde_json::Value,
    /// Unix seconds, kept alongside `created_at` for range queries
    pub timestamp: i64,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        seq: i64,
        namespace_id: &str,
        object_type: &str,
        object_id: &str,
        command: TxnCommand,
        snapshot: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            seq,
            id: crate::public_id::generate(),
            namespace_id: namespace_id.to_string(),
            object_type: object_type.to_string(),
            object_id: object_id.to_string(),
            command,
            snapshot,
            timestamp: now.timestamp(),
            created_at: now,
        }
    }
}
