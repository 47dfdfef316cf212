use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::dbs::common::{self, *};
use crate::error::{PersistError, Result};
use crate::filter::Filter;
use crate::models::{
    is_reserved_name, rank_search, Block, Contact, ContactSource, Draft, DraftState, DraftUpdate,
    Message, Namespace, NewBlock, NewDraft, NewMessage, NewWebhook, Tag, TagRef, Thread,
    Transaction, TxnCommand, Webhook, START_STAMP,
};
use crate::trait_client::PersistenceClient;

#[derive(Default)]
struct Store {
    namespaces: Vec<Namespace>,
    tags: Vec<Tag>,
    threads: Vec<Thread>,
    messages: Vec<Message>,
    contacts: Vec<Contact>,
    blocks: Vec<Block>,
    webhooks: Vec<Webhook>,
    drafts: Vec<Draft>,
    transactions: Vec<Transaction>,
}

impl Store {
    fn record<T: Serialize>(
        &mut self,
        namespace_id: &str,
        object_type: &str,
        object_id: &str,
        command: TxnCommand,
        object: &T,
    ) -> Result<()> {
        let snapshot = serde_json::to_value(object)?;
        let seq = self.transactions.len() as i64 + 1;
        self.transactions.push(Transaction::new(
            seq,
            namespace_id,
            object_type,
            object_id,
            command,
            snapshot,
        ));
        Ok(())
    }

    fn namespace(&self, namespace_id: &str) -> Result<&Namespace> {
        self.namespaces
            .iter()
            .find(|n| n.id == namespace_id)
            .ok_or_else(|| PersistError::NamespaceNotFound(namespace_id.to_string()))
    }

    fn thread_index(&self, namespace_id: &str, thread_id: &str) -> Result<usize> {
        self.threads
            .iter()
            .position(|t| t.namespace_id == namespace_id && t.id == thread_id)
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))
    }

    fn draft_index(&self, namespace_id: &str, draft_id: &str) -> Result<usize> {
        self.drafts
            .iter()
            .position(|d| d.namespace_id == namespace_id && d.id == draft_id)
            .ok_or_else(|| PersistError::DraftNotFound(draft_id.to_string()))
    }

    fn record_thread(&mut self, idx: usize, command: TxnCommand) -> Result<()> {
        let thread = self.threads[idx].clone();
        self.record(&thread.namespace_id, OBJECT_THREAD, &thread.id, command, &thread)
    }
}

/// Process-local backend, used for development and tests.
///
/// A single lock guards the whole store so every trait call is applied
/// atomically.
#[derive(Default)]
pub struct MemoryPersistenceClient {
    store: RwLock<Store>,
}

impl MemoryPersistenceClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceClient for MemoryPersistenceClient {
    async fn create_namespace(
        &self,
        account_id: &str,
        email_address: &str,
        provider: &str,
    ) -> Result<Namespace> {
        let mut store = self.store.write().await;

        let namespace = Namespace {
            id: crate::public_id::generate(),
            account_id: account_id.to_string(),
            email_address: email_address.to_string(),
            provider: provider.to_string(),
            created_at: Utc::now(),
        };
        store.tags.extend(Tag::canonical_set(&namespace.id));
        store.namespaces.push(namespace.clone());
        store.record(&namespace.id, OBJECT_NAMESPACE, &namespace.id, TxnCommand::Insert, &namespace)?;

        Ok(namespace)
    }

    async fn get_namespace(&self, namespace_id: &str) -> Result<Option<Namespace>> {
        let store = self.store.read().await;
        Ok(store.namespaces.iter().find(|n| n.id == namespace_id).cloned())
    }

    async fn find_namespace_by_email(&self, email_address: &str) -> Result<Option<Namespace>> {
        let store = self.store.read().await;
        Ok(store
            .namespaces
            .iter()
            .find(|n| n.email_address.eq_ignore_ascii_case(email_address))
            .cloned())
    }

    async fn list_tags(&self, namespace_id: &str) -> Result<Vec<Tag>> {
        let store = self.store.read().await;
        Ok(store
            .tags
            .iter()
            .filter(|t| t.namespace_id == namespace_id)
            .cloned()
            .collect())
    }

    async fn find_tag(&self, namespace_id: &str, name_or_id: &str) -> Result<Option<Tag>> {
        let store = self.store.read().await;
        Ok(store
            .tags
            .iter()
            .find(|t| t.namespace_id == namespace_id && t.is(name_or_id))
            .cloned())
    }

    async fn tag_name_available(&self, namespace_id: &str, name: &str) -> Result<bool> {
        let store = self.store.read().await;
        Ok(!is_reserved_name(name)
            && !store
                .tags
                .iter()
                .any(|t| t.namespace_id == namespace_id && t.name == name))
    }

    async fn create_tag(&self, namespace_id: &str, name: &str) -> Result<Tag> {
        let mut store = self.store.write().await;
        store.namespace(namespace_id)?;

        let taken = store
            .tags
            .iter()
            .any(|t| t.namespace_id == namespace_id && t.name == name);
        if taken || is_reserved_name(name) {
            return Err(PersistError::TagNameUnavailable(name.to_string()));
        }

        let tag = Tag::user(namespace_id, name);
        store.tags.push(tag.clone());
        store.record(namespace_id, OBJECT_TAG, &tag.id, TxnCommand::Insert, &tag)?;
        Ok(tag)
    }

    async fn query_threads(&self, filter: &Filter) -> Result<Vec<Thread>> {
        let store = self.store.read().await;
        let ns = filter.namespace_id.as_str();

        let threads: Vec<Thread> = store
            .threads
            .iter()
            .filter(|t| t.namespace_id == ns)
            .cloned()
            .collect();
        let messages: Vec<Message> = if filter.needs_messages() {
            store
                .messages
                .iter()
                .filter(|m| m.namespace_id == ns)
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        Ok(filter.apply_threads(threads, &messages))
    }

    async fn get_thread(&self, namespace_id: &str, thread_id: &str) -> Result<Option<Thread>> {
        let store = self.store.read().await;
        Ok(store
            .threads
            .iter()
            .find(|t| t.namespace_id == namespace_id && t.id == thread_id)
            .cloned())
    }

    async fn update_thread_tags(
        &self,
        namespace_id: &str,
        thread_id: &str,
        add: &[Tag],
        remove: &[Tag],
    ) -> Result<Thread> {
        let mut store = self.store.write().await;
        let idx = store.thread_index(namespace_id, thread_id)?;

        let thread = &mut store.threads[idx];
        let mut changed = false;
        for tag in remove {
            changed |= thread.remove_tag(&tag.id);
        }
        for tag in add {
            changed |= thread.apply_tag(&tag.to_ref());
        }

        if changed {
            store.record_thread(idx, TxnCommand::Update)?;
        }
        Ok(store.threads[idx].clone())
    }

    async fn ingest_message(&self, namespace_id: &str, new: NewMessage) -> Result<Message> {
        let mut store = self.store.write().await;
        store.namespace(namespace_id)?;

        let (idx, command) = match new.thread_id.as_deref() {
            Some(thread_id) => (store.thread_index(namespace_id, thread_id)?, TxnCommand::Update),
            None => {
                store.threads.push(Thread::new(namespace_id, new.subject.clone(), new.date));
                (store.threads.len() - 1, TxnCommand::Insert)
            }
        };
        let thread_id = store.threads[idx].id.clone();

        let mut blocks: Vec<Block> = new
            .files
            .iter()
            .cloned()
            .map(|mut b| {
                b.content_disposition
                    .get_or_insert_with(|| DEFAULT_CONTENT_DISPOSITION.to_string());
                Block::from_new(namespace_id, b, None)
            })
            .collect();
        let message = Message::from_new(
            namespace_id,
            &thread_id,
            &new,
            blocks.iter().map(Block::to_ref).collect(),
        );
        for block in blocks.iter_mut() {
            block.message_id = Some(message.id.clone());
        }

        let thread = &mut store.threads[idx];
        thread.absorb_message(&message);
        common::tag_new_message(thread, &message);

        store.messages.push(message.clone());
        for block in blocks {
            store.record(namespace_id, OBJECT_FILE, &block.id, TxnCommand::Insert, &block.to_ref())?;
            store.blocks.push(block);
        }
        store.record(namespace_id, OBJECT_MESSAGE, &message.id, TxnCommand::Insert, &message)?;
        store.record_thread(idx, command)?;

        tracing::debug!(namespace_id, message_id = %message.id, thread_id = %thread_id, "Message ingested");
        Ok(message)
    }

    async fn query_messages(&self, filter: &Filter) -> Result<Vec<Message>> {
        let store = self.store.read().await;
        let ns = filter.namespace_id.as_str();

        let messages: Vec<Message> = store
            .messages
            .iter()
            .filter(|m| m.namespace_id == ns)
            .cloned()
            .collect();
        let threads: Vec<Thread> = store
            .threads
            .iter()
            .filter(|t| t.namespace_id == ns)
            .cloned()
            .collect();

        Ok(filter.apply_messages(messages, &threads))
    }

    async fn get_message(&self, namespace_id: &str, message_id: &str) -> Result<Option<Message>> {
        let store = self.store.read().await;
        Ok(store
            .messages
            .iter()
            .find(|m| m.namespace_id == namespace_id && m.id == message_id)
            .cloned())
    }

    async fn set_message_unread(
        &self,
        namespace_id: &str,
        message_id: &str,
        unread: bool,
    ) -> Result<Message> {
        let mut store = self.store.write().await;

        let midx = store
            .messages
            .iter()
            .position(|m| m.namespace_id == namespace_id && m.id == message_id)
            .ok_or_else(|| PersistError::MessageNotFound(message_id.to_string()))?;
        store.messages[midx].is_read = !unread;
        let message = store.messages[midx].clone();

        let all_read = store
            .messages
            .iter()
            .filter(|m| m.thread_id == message.thread_id)
            .all(|m| m.is_read);
        let tidx = store.thread_index(namespace_id, &message.thread_id)?;
        common::apply_read_state(&mut store.threads[tidx], unread, all_read);

        store.record(namespace_id, OBJECT_MESSAGE, &message.id, TxnCommand::Update, &message)?;
        store.record_thread(tidx, TxnCommand::Update)?;
        Ok(message)
    }

    async fn list_contacts(&self, namespace_id: &str, limit: usize, offset: usize) -> Result<Vec<Contact>> {
        let store = self.store.read().await;
        Ok(store
            .contacts
            .iter()
            .filter(|c| c.namespace_id == namespace_id && c.source == ContactSource::Local)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn search_contacts(
        &self,
        namespace_id: &str,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Contact>> {
        let store = self.store.read().await;
        let contacts = store
            .contacts
            .iter()
            .filter(|c| c.namespace_id == namespace_id)
            .cloned()
            .collect();
        Ok(rank_search(contacts, query, limit, offset))
    }

    async fn create_contact(
        &self,
        namespace_id: &str,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<Contact> {
        let mut store = self.store.write().await;
        let account_id = store.namespace(namespace_id)?.account_id.clone();

        let contact = Contact::new(namespace_id, &account_id, name, email, ContactSource::Local);
        store.contacts.push(contact.clone());
        store.record(namespace_id, OBJECT_CONTACT, &contact.id, TxnCommand::Insert, &contact)?;
        Ok(contact)
    }

    async fn get_contact(&self, namespace_id: &str, contact_id: &str) -> Result<Option<Contact>> {
        let store = self.store.read().await;
        Ok(store
            .contacts
            .iter()
            .find(|c| c.namespace_id == namespace_id && c.id == contact_id)
            .cloned())
    }

    async fn list_blocks(
        &self,
        namespace_id: &str,
        filename: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Block>> {
        let store = self.store.read().await;
        Ok(store
            .blocks
            .iter()
            .filter(|b| b.namespace_id == namespace_id)
            .filter(|b| filename.is_none() || b.filename.as_deref() == filename)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_block(&self, namespace_id: &str, block_id: &str) -> Result<Option<Block>> {
        let store = self.store.read().await;
        Ok(store
            .blocks
            .iter()
            .find(|b| b.namespace_id == namespace_id && b.id == block_id)
            .cloned())
    }

    async fn insert_blocks(&self, namespace_id: &str, blocks: Vec<NewBlock>) -> Result<Vec<Block>> {
        let mut store = self.store.write().await;
        store.namespace(namespace_id)?;

        let blocks: Vec<Block> = blocks
            .into_iter()
            .map(|b| Block::from_new(namespace_id, b, None))
            .collect();
        for block in &blocks {
            store.blocks.push(block.clone());
            store.record(namespace_id, OBJECT_FILE, &block.id, TxnCommand::Insert, &block.to_ref())?;
        }
        Ok(blocks)
    }

    async fn list_webhooks(&self, namespace_id: &str) -> Result<Vec<Webhook>> {
        let store = self.store.read().await;
        Ok(store
            .webhooks
            .iter()
            .filter(|w| w.namespace_id == namespace_id)
            .cloned()
            .collect())
    }

    async fn get_webhook(&self, namespace_id: &str, webhook_id: &str) -> Result<Option<Webhook>> {
        let store = self.store.read().await;
        Ok(store
            .webhooks
            .iter()
            .find(|w| w.namespace_id == namespace_id && w.id == webhook_id)
            .cloned())
    }

    async fn create_webhook(&self, namespace_id: &str, new: NewWebhook) -> Result<Webhook> {
        let mut store = self.store.write().await;
        store.namespace(namespace_id)?;

        let webhook = Webhook {
            id: crate::public_id::generate(),
            namespace_id: namespace_id.to_string(),
            callback_url: new.callback_url,
            failure_notify_url: new.failure_notify_url,
            include_body: new.include_body,
            active: new.active,
            min_processed_id: store.transactions.last().map(|t| t.seq).unwrap_or(0),
            filters: new.filters,
            created_at: Utc::now(),
        };
        store.webhooks.push(webhook.clone());
        store.record(namespace_id, OBJECT_WEBHOOK, &webhook.id, TxnCommand::Insert, &webhook)?;
        Ok(webhook)
    }

    async fn set_webhook_active(&self, webhook_id: &str, active: bool) -> Result<Webhook> {
        let mut store = self.store.write().await;

        let webhook = store
            .webhooks
            .iter_mut()
            .find(|w| w.id == webhook_id)
            .ok_or_else(|| PersistError::WebhookNotFound(webhook_id.to_string()))?;
        webhook.active = active;
        let webhook = webhook.clone();

        store.record(&webhook.namespace_id, OBJECT_WEBHOOK, &webhook.id, TxnCommand::Update, &webhook)?;
        Ok(webhook)
    }

    async fn list_drafts(&self, namespace_id: &str) -> Result<Vec<Draft>> {
        let store = self.store.read().await;
        Ok(store
            .drafts
            .iter()
            .filter(|d| d.namespace_id == namespace_id && d.is_latest() && d.is_draft())
            .cloned()
            .collect())
    }

    async fn get_draft(&self, namespace_id: &str, draft_id: &str) -> Result<Option<Draft>> {
        let store = self.store.read().await;
        Ok(store
            .drafts
            .iter()
            .find(|d| d.namespace_id == namespace_id && d.id == draft_id)
            .cloned())
    }

    async fn create_draft(&self, namespace_id: &str, new: NewDraft) -> Result<Draft> {
        let mut store = self.store.write().await;
        store.namespace(namespace_id)?;

        let (idx, command) = match new.reply_to_thread.as_deref() {
            Some(thread_id) => (store.thread_index(namespace_id, thread_id)?, TxnCommand::Update),
            None => {
                store.threads.push(Thread::new(namespace_id, new.subject.clone(), Utc::now()));
                (store.threads.len() - 1, TxnCommand::Insert)
            }
        };

        let draft = Draft::from_new(namespace_id, &store.threads[idx].id.clone(), &new);
        common::attach_draft(&mut store.threads[idx], &draft, &new.tags);

        store.drafts.push(draft.clone());
        store.record(namespace_id, OBJECT_DRAFT, &draft.id, TxnCommand::Insert, &draft)?;
        store.record_thread(idx, command)?;
        Ok(draft)
    }

    async fn update_draft(&self, namespace_id: &str, parent_id: &str, update: DraftUpdate) -> Result<Draft> {
        let mut store = self.store.write().await;
        let pidx = store.draft_index(namespace_id, parent_id)?;
        let parent = store.drafts[pidx].clone();

        if let Some(latest_id) = parent.most_recent_revision_id.clone() {
            return Err(PersistError::DraftConflict {
                draft_id: parent.id,
                latest_id,
            });
        }
        if !parent.is_draft() {
            return Err(PersistError::NotADraft(parent.id));
        }

        let child = parent.revise(&update);
        for draft in store.drafts.iter_mut().filter(|d| d.root_id == parent.root_id) {
            draft.most_recent_revision_id = Some(child.id.clone());
            draft.updated_at = child.created_at;
        }

        let tidx = store.thread_index(namespace_id, &parent.thread_id)?;
        common::replace_draft(&mut store.threads[tidx], &parent, &child, &update.tags);

        store.drafts.push(child.clone());
        store.record(namespace_id, OBJECT_DRAFT, &child.id, TxnCommand::Insert, &child)?;
        store.record_thread(tidx, TxnCommand::Update)?;
        Ok(child)
    }

    async fn delete_draft(&self, namespace_id: &str, draft_id: &str) -> Result<Draft> {
        let mut store = self.store.write().await;
        let idx = store.draft_index(namespace_id, draft_id)?;
        let draft = store.drafts[idx].clone();
        if !draft.is_draft() {
            return Err(PersistError::NotADraft(draft.id));
        }

        let chain: Vec<Draft> = store
            .drafts
            .iter()
            .filter(|d| d.root_id == draft.root_id)
            .cloned()
            .collect();
        let chain_ids: Vec<String> = chain.iter().map(|d| d.id.clone()).collect();
        store.drafts.retain(|d| d.root_id != draft.root_id);
        for revision in &chain {
            store.record(namespace_id, OBJECT_DRAFT, &revision.id, TxnCommand::Delete, revision)?;
        }

        if let Ok(tidx) = store.thread_index(namespace_id, &draft.thread_id) {
            if common::detach_drafts(&mut store.threads[tidx], &chain_ids) {
                let thread = store.threads.remove(tidx);
                store.record(namespace_id, OBJECT_THREAD, &thread.id, TxnCommand::Delete, &thread)?;
            } else {
                store.record_thread(tidx, TxnCommand::Update)?;
            }
        }
        Ok(draft)
    }

    async fn mark_draft_sending(&self, namespace_id: &str, draft_id: &str) -> Result<Draft> {
        let mut store = self.store.write().await;
        let idx = store.draft_index(namespace_id, draft_id)?;
        if !store.drafts[idx].is_draft() {
            return Err(PersistError::NotADraft(draft_id.to_string()));
        }

        store.drafts[idx].state = DraftState::Sending;
        store.drafts[idx].updated_at = Utc::now();
        let draft = store.drafts[idx].clone();

        if let Ok(tidx) = store.thread_index(namespace_id, &draft.thread_id) {
            if store.threads[tidx].apply_tag(&TagRef::canonical("sending")) {
                store.record_thread(tidx, TxnCommand::Update)?;
            }
        }
        store.record(namespace_id, OBJECT_DRAFT, &draft.id, TxnCommand::Update, &draft)?;
        Ok(draft)
    }

    async fn stamp_from_timestamp(&self, namespace_id: &str, at: DateTime<Utc>) -> Result<String> {
        let store = self.store.read().await;
        let cutoff = at.timestamp();
        Ok(store
            .transactions
            .iter()
            .rev()
            .find(|t| t.namespace_id == namespace_id && t.timestamp <= cutoff)
            .map(|t| t.id.clone())
            .unwrap_or_else(|| START_STAMP.to_string()))
    }

    async fn events_from_stamp(&self, namespace_id: &str, stamp: &str, limit: usize) -> Result<Vec<Transaction>> {
        let store = self.store.read().await;

        let start_seq = if stamp == START_STAMP {
            0
        } else {
            store
                .transactions
                .iter()
                .find(|t| t.namespace_id == namespace_id && t.id == stamp)
                .map(|t| t.seq)
                .ok_or_else(|| PersistError::InvalidStamp(stamp.to_string()))?
        };

        Ok(store
            .transactions
            .iter()
            .filter(|t| t.namespace_id == namespace_id && t.seq > start_seq)
            .take(limit)
            .cloned()
            .collect())
    }
}
