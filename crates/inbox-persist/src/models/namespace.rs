use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Tenant scoping unit: every other object belongs to exactly one namespace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: String,
    pub account_id: String,
    pub email_address: String,
    pub provider: String,
    pub created_at: DateTime<Utc>,
}
