use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::filter::Filter;
use crate::models::{
    Block, Contact, Draft, DraftUpdate, Message, Namespace, NewBlock, NewDraft, NewMessage,
    NewWebhook, Tag, Thread, Transaction, Webhook,
};

/// Trait for database persistence operations
/// 
/// Every lookup by public id is scoped to a namespace: an object that
/// belongs to another namespace is reported as absent. Every mutation
/// appends to the namespace's transaction log.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Create a namespace and seed its canonical tags
    async fn create_namespace(
        &self,
        account_id: &str,
        email_address: &str,
        provider: &str,
    ) -> Result<Namespace>;
    
    /// Get a namespace by public id
    async fn get_namespace(&self, namespace_id: &str) -> Result<Option<Namespace>>;
    
    /// Find the namespace bound to an email address
    async fn find_namespace_by_email(&self, email_address: &str) -> Result<Option<Namespace>>;
    
    /// All tags of a namespace, canonical ones first
    async fn list_tags(&self, namespace_id: &str) -> Result<Vec<Tag>>;
    
    /// Find a tag by name or public id
    async fn find_tag(&self, namespace_id: &str, name_or_id: &str) -> Result<Option<Tag>>;
    
    /// Whether a user tag may be created under this name
    async fn tag_name_available(&self, namespace_id: &str, name: &str) -> Result<bool>;
    
    /// Create a user tag; fails with `TagNameUnavailable` if taken or reserved
    async fn create_tag(&self, namespace_id: &str, name: &str) -> Result<Tag>;
    
    /// Threads matching a filter, ordered and paged
    async fn query_threads(&self, filter: &Filter) -> Result<Vec<Thread>>;
    
    /// Get a thread by public id
    async fn get_thread(&self, namespace_id: &str, thread_id: &str) -> Result<Option<Thread>>;
    
    /// Remove then apply tags on a thread in one step
    async fn update_thread_tags(
        &self,
        namespace_id: &str,
        thread_id: &str,
        add: &[Tag],
        remove: &[Tag],
    ) -> Result<Thread>;
    
    /// Store a message delivered by the mail sync engine, threading it
    async fn ingest_message(&self, namespace_id: &str, message: NewMessage) -> Result<Message>;
    
    /// Messages matching a filter, ordered and paged
    async fn query_messages(&self, filter: &Filter) -> Result<Vec<Message>>;
    
    /// Get a message by public id
    async fn get_message(&self, namespace_id: &str, message_id: &str) -> Result<Option<Message>>;
    
    /// Mark a message read or unread and keep the thread's tags in step
    async fn set_message_unread(
        &self,
        namespace_id: &str,
        message_id: &str,
        unread: bool,
    ) -> Result<Message>;
    
    /// Locally created contacts, in creation order
    async fn list_contacts(&self, namespace_id: &str, limit: usize, offset: usize) -> Result<Vec<Contact>>;
    
    /// Contacts ranked against a free-text query
    async fn search_contacts(
        &self,
        namespace_id: &str,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Contact>>;
    
    /// Create a local contact
    async fn create_contact(
        &self,
        namespace_id: &str,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<Contact>;
    
    /// Get a contact by public id
    async fn get_contact(&self, namespace_id: &str, contact_id: &str) -> Result<Option<Contact>>;
    
    /// Files of a namespace, optionally by exact filename
    async fn list_blocks(
        &self,
        namespace_id: &str,
        filename: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Block>>;
    
    /// Get a file by public id
    async fn get_block(&self, namespace_id: &str, block_id: &str) -> Result<Option<Block>>;
    
    /// Store uploaded files
    async fn insert_blocks(&self, namespace_id: &str, blocks: Vec<NewBlock>) -> Result<Vec<Block>>;
    
    /// Webhooks of a namespace
    async fn list_webhooks(&self, namespace_id: &str) -> Result<Vec<Webhook>>;
    
    /// Get a webhook by public id
    async fn get_webhook(&self, namespace_id: &str, webhook_id: &str) -> Result<Option<Webhook>>;
    
    /// Register a webhook starting after the current end of the sync log
    async fn create_webhook(&self, namespace_id: &str, webhook: NewWebhook) -> Result<Webhook>;
    
    /// Toggle a webhook; addressed by public id alone, as the webhook server does
    async fn set_webhook_active(&self, webhook_id: &str, active: bool) -> Result<Webhook>;
    
    /// Latest revision of every unsent draft
    async fn list_drafts(&self, namespace_id: &str) -> Result<Vec<Draft>>;
    
    /// Get any draft revision by public id
    async fn get_draft(&self, namespace_id: &str, draft_id: &str) -> Result<Option<Draft>>;
    
    /// Create a draft on a new thread or as a reply
    async fn create_draft(&self, namespace_id: &str, draft: NewDraft) -> Result<Draft>;
    
    /// Create a new revision of the latest draft `parent_id`
    async fn update_draft(&self, namespace_id: &str, parent_id: &str, update: DraftUpdate) -> Result<Draft>;
    
    /// Delete a draft and every revision in its chain
    async fn delete_draft(&self, namespace_id: &str, draft_id: &str) -> Result<Draft>;
    
    /// Hand a draft to the delivery pipeline
    async fn mark_draft_sending(&self, namespace_id: &str, draft_id: &str) -> Result<Draft>;
    
    /// Stamp of the newest transaction created at or before `at`
    async fn stamp_from_timestamp(&self, namespace_id: &str, at: DateTime<Utc>) -> Result<String>;
    
    /// Transactions after `stamp`, oldest first; fails with `InvalidStamp`
    async fn events_from_stamp(&self, namespace_id: &str, stamp: &str, limit: usize) -> Result<Vec<Transaction>>;
}
