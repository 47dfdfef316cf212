use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection, Database};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::dbs::common::{self, *};
use crate::error::{PersistError, Result};
use crate::filter::Filter;
use crate::models::{
    is_reserved_name, rank_search, Block, Contact, ContactSource, Draft, DraftState, DraftUpdate,
    Message, Namespace, NewBlock, NewDraft, NewMessage, NewWebhook, Tag, TagRef, Thread,
    Transaction, TxnCommand, Webhook, START_STAMP,
};
use crate::trait_client::PersistenceClient;

const TRANSACTION_COUNTER: &str = "transactions";

/// MongoDB backend. Documents are the models themselves, addressed by
/// their public `id`; the driver's `_id` only provides insertion order.
pub struct MongoPersistenceClient {
    namespaces: Collection<Namespace>,
    tags: Collection<Tag>,
    threads: Collection<Thread>,
    messages: Collection<Message>,
    contacts: Collection<Contact>,
    blocks: Collection<Block>,
    webhooks: Collection<Webhook>,
    drafts: Collection<Draft>,
    transactions: Collection<Transaction>,
    counters: Collection<Document>,
}

impl MongoPersistenceClient {
    /// Connect to MongoDB and create client
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        Ok(Self::from_database(&client.database(database)))
    }

    pub fn from_database(db: &Database) -> Self {
        Self {
            namespaces: db.collection("namespaces"),
            tags: db.collection("tags"),
            threads: db.collection("threads"),
            messages: db.collection("messages"),
            contacts: db.collection("contacts"),
            blocks: db.collection("blocks"),
            webhooks: db.collection("webhooks"),
            drafts: db.collection("drafts"),
            transactions: db.collection("transactions"),
            counters: db.collection("counters"),
        }
    }

    async fn find_all<T>(collection: &Collection<T>, filter: Document) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Unpin + Send + Sync,
    {
        let items = collection
            .find(filter)
            .sort(doc! { "_id": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(items)
    }

    async fn find_page<T>(collection: &Collection<T>, filter: Document, limit: usize, offset: usize) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Unpin + Send + Sync,
    {
        let items = collection
            .find(filter)
            .sort(doc! { "_id": 1 })
            .skip(offset as u64)
            .limit(limit as i64)
            .await?
            .try_collect()
            .await?;
        Ok(items)
    }

    async fn next_seq(&self) -> Result<i64> {
        let counter = self
            .counters
            .find_one_and_update(
                doc! { "_id": TRANSACTION_COUNTER },
                doc! { "$inc": { "seq": 1_i64 } },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| PersistError::Internal("transaction counter missing".to_string()))?;

        counter
            .get_i64("seq")
            .map_err(|e| PersistError::Internal(format!("bad transaction counter: {}", e)))
    }

    async fn current_seq(&self) -> Result<i64> {
        let counter = self
            .counters
            .find_one(doc! { "_id": TRANSACTION_COUNTER })
            .await?;
        Ok(counter.and_then(|c| c.get_i64("seq").ok()).unwrap_or(0))
    }

    async fn record<T: Serialize + Sync>(
        &self,
        namespace_id: &str,
        object_type: &str,
        object_id: &str,
        command: TxnCommand,
        object: &T,
    ) -> Result<()> {
        let snapshot = serde_json::to_value(object)?;
        let seq = self.next_seq().await?;
        let txn = Transaction::new(seq, namespace_id, object_type, object_id, command, snapshot);
        self.transactions.insert_one(&txn).await?;
        Ok(())
    }

    async fn require_namespace(&self, namespace_id: &str) -> Result<Namespace> {
        self.namespaces
            .find_one(doc! { "id": namespace_id })
            .await?
            .ok_or_else(|| PersistError::NamespaceNotFound(namespace_id.to_string()))
    }

    async fn require_thread(&self, namespace_id: &str, thread_id: &str) -> Result<Thread> {
        self.threads
            .find_one(doc! { "namespace_id": namespace_id, "id": thread_id })
            .await?
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))
    }

    async fn require_draft(&self, namespace_id: &str, draft_id: &str) -> Result<Draft> {
        self.drafts
            .find_one(doc! { "namespace_id": namespace_id, "id": draft_id })
            .await?
            .ok_or_else(|| PersistError::DraftNotFound(draft_id.to_string()))
    }

    async fn save_thread(&self, thread: &Thread, command: TxnCommand) -> Result<()> {
        match command {
            TxnCommand::Insert => {
                self.threads.insert_one(thread).await?;
            }
            TxnCommand::Update => {
                self.threads
                    .replace_one(doc! { "id": thread.id.as_str() }, thread)
                    .await?;
            }
            TxnCommand::Delete => {
                self.threads
                    .delete_one(doc! { "id": thread.id.as_str() })
                    .await?;
            }
        }
        self.record(&thread.namespace_id, OBJECT_THREAD, &thread.id, command, thread).await
    }
}

#[async_trait]
impl PersistenceClient for MongoPersistenceClient {
    async fn create_namespace(
        &self,
        account_id: &str,
        email_address: &str,
        provider: &str,
    ) -> Result<Namespace> {
        let namespace = Namespace {
            id: crate::public_id::generate(),
            account_id: account_id.to_string(),
            email_address: email_address.to_string(),
            provider: provider.to_string(),
            created_at: Utc::now(),
        };

        self.namespaces.insert_one(&namespace).await?;
        self.tags.insert_many(Tag::canonical_set(&namespace.id)).await?;
        self.record(&namespace.id, OBJECT_NAMESPACE, &namespace.id, TxnCommand::Insert, &namespace).await?;

        tracing::info!(namespace_id = %namespace.id, email_address, "Namespace created");
        Ok(namespace)
    }

    async fn get_namespace(&self, namespace_id: &str) -> Result<Option<Namespace>> {
        Ok(self.namespaces.find_one(doc! { "id": namespace_id }).await?)
    }

    async fn find_namespace_by_email(&self, email_address: &str) -> Result<Option<Namespace>> {
        Ok(self
            .namespaces
            .find_one(doc! { "email_address": email_address })
            .await?)
    }

    async fn list_tags(&self, namespace_id: &str) -> Result<Vec<Tag>> {
        Self::find_all(&self.tags, doc! { "namespace_id": namespace_id }).await
    }

    async fn find_tag(&self, namespace_id: &str, name_or_id: &str) -> Result<Option<Tag>> {
        let filter = doc! {
            "namespace_id": namespace_id,
            "$or": [ { "id": name_or_id }, { "name": name_or_id } ],
        };
        Ok(self.tags.find_one(filter).await?)
    }

    async fn tag_name_available(&self, namespace_id: &str, name: &str) -> Result<bool> {
        if is_reserved_name(name) {
            return Ok(false);
        }
        let existing = self
            .tags
            .find_one(doc! { "namespace_id": namespace_id, "name": name })
            .await?;
        Ok(existing.is_none())
    }

    async fn create_tag(&self, namespace_id: &str, name: &str) -> Result<Tag> {
        self.require_namespace(namespace_id).await?;
        if !self.tag_name_available(namespace_id, name).await? {
            return Err(PersistError::TagNameUnavailable(name.to_string()));
        }

        let tag = Tag::user(namespace_id, name);
        self.tags.insert_one(&tag).await?;
        self.record(namespace_id, OBJECT_TAG, &tag.id, TxnCommand::Insert, &tag).await?;
        Ok(tag)
    }

    async fn query_threads(&self, filter: &Filter) -> Result<Vec<Thread>> {
        let ns = filter.namespace_id.as_str();
        let mut query = doc! { "namespace_id": ns };
        if let Some(ref thread_id) = filter.thread_id {
            query.insert("id", thread_id.as_str());
        }
        if let Some(ref subject) = filter.subject {
            query.insert("subject", subject.as_str());
        }

        let threads = Self::find_all(&self.threads, query).await?;
        let messages = if filter.needs_messages() {
            Self::find_all(&self.messages, doc! { "namespace_id": ns }).await?
        } else {
            Vec::new()
        };

        Ok(filter.apply_threads(threads, &messages))
    }

    async fn get_thread(&self, namespace_id: &str, thread_id: &str) -> Result<Option<Thread>> {
        Ok(self
            .threads
            .find_one(doc! { "namespace_id": namespace_id, "id": thread_id })
            .await?)
    }

    async fn update_thread_tags(
        &self,
        namespace_id: &str,
        thread_id: &str,
        add: &[Tag],
        remove: &[Tag],
    ) -> Result<Thread> {
        let mut thread = self.require_thread(namespace_id, thread_id).await?;

        let mut changed = false;
        for tag in remove {
            changed |= thread.remove_tag(&tag.id);
        }
        for tag in add {
            changed |= thread.apply_tag(&tag.to_ref());
        }

        if changed {
            self.save_thread(&thread, TxnCommand::Update).await?;
        }
        Ok(thread)
    }

    async fn ingest_message(&self, namespace_id: &str, new: NewMessage) -> Result<Message> {
        self.require_namespace(namespace_id).await?;

        let (mut thread, command) = match new.thread_id.as_deref() {
            Some(thread_id) => (self.require_thread(namespace_id, thread_id).await?, TxnCommand::Update),
            None => (Thread::new(namespace_id, new.subject.clone(), new.date), TxnCommand::Insert),
        };

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
            &thread.id,
            &new,
            blocks.iter().map(Block::to_ref).collect(),
        );
        for block in blocks.iter_mut() {
            block.message_id = Some(message.id.clone());
        }

        thread.absorb_message(&message);
        common::tag_new_message(&mut thread, &message);

        for block in &blocks {
            self.blocks.insert_one(block).await?;
            self.record(namespace_id, OBJECT_FILE, &block.id, TxnCommand::Insert, &block.to_ref()).await?;
        }
        self.messages.insert_one(&message).await?;
        self.record(namespace_id, OBJECT_MESSAGE, &message.id, TxnCommand::Insert, &message).await?;
        self.save_thread(&thread, command).await?;

        tracing::debug!(namespace_id, message_id = %message.id, thread_id = %thread.id, "Message ingested");
        Ok(message)
    }

    async fn query_messages(&self, filter: &Filter) -> Result<Vec<Message>> {
        let ns = filter.namespace_id.as_str();
        let mut query = doc! { "namespace_id": ns };
        if let Some(ref thread_id) = filter.thread_id {
            query.insert("thread_id", thread_id.as_str());
        }

        let messages = Self::find_all(&self.messages, query).await?;
        let threads = Self::find_all(&self.threads, doc! { "namespace_id": ns }).await?;

        Ok(filter.apply_messages(messages, &threads))
    }

    async fn get_message(&self, namespace_id: &str, message_id: &str) -> Result<Option<Message>> {
        Ok(self
            .messages
            .find_one(doc! { "namespace_id": namespace_id, "id": message_id })
            .await?)
    }

    async fn set_message_unread(
        &self,
        namespace_id: &str,
        message_id: &str,
        unread: bool,
    ) -> Result<Message> {
        let mut message = self
            .get_message(namespace_id, message_id)
            .await?
            .ok_or_else(|| PersistError::MessageNotFound(message_id.to_string()))?;
        message.is_read = !unread;
        self.messages
            .replace_one(doc! { "id": message.id.as_str() }, &message)
            .await?;

        let unread_left = self
            .messages
            .count_documents(doc! { "thread_id": message.thread_id.as_str(), "is_read": false })
            .await?;
        let mut thread = self.require_thread(namespace_id, &message.thread_id).await?;
        common::apply_read_state(&mut thread, unread, unread_left == 0);

        self.record(namespace_id, OBJECT_MESSAGE, &message.id, TxnCommand::Update, &message).await?;
        self.save_thread(&thread, TxnCommand::Update).await?;
        Ok(message)
    }

    async fn list_contacts(&self, namespace_id: &str, limit: usize, offset: usize) -> Result<Vec<Contact>> {
        let filter = doc! { "namespace_id": namespace_id, "source": "local" };
        Self::find_page(&self.contacts, filter, limit, offset).await
    }

    async fn search_contacts(
        &self,
        namespace_id: &str,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Contact>> {
        let contacts = Self::find_all(&self.contacts, doc! { "namespace_id": namespace_id }).await?;
        Ok(rank_search(contacts, query, limit, offset))
    }

    async fn create_contact(
        &self,
        namespace_id: &str,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<Contact> {
        let namespace = self.require_namespace(namespace_id).await?;

        let contact = Contact::new(namespace_id, &namespace.account_id, name, email, ContactSource::Local);
        self.contacts.insert_one(&contact).await?;
        self.record(namespace_id, OBJECT_CONTACT, &contact.id, TxnCommand::Insert, &contact).await?;
        Ok(contact)
    }

    async fn get_contact(&self, namespace_id: &str, contact_id: &str) -> Result<Option<Contact>> {
        Ok(self
            .contacts
            .find_one(doc! { "namespace_id": namespace_id, "id": contact_id })
            .await?)
    }

    async fn list_blocks(
        &self,
        namespace_id: &str,
        filename: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Block>> {
        let mut filter = doc! { "namespace_id": namespace_id };
        if let Some(filename) = filename {
            filter.insert("filename", filename);
        }
        Self::find_page(&self.blocks, filter, limit, offset).await
    }

    async fn get_block(&self, namespace_id: &str, block_id: &str) -> Result<Option<Block>> {
        Ok(self
            .blocks
            .find_one(doc! { "namespace_id": namespace_id, "id": block_id })
            .await?)
    }

    async fn insert_blocks(&self, namespace_id: &str, blocks: Vec<NewBlock>) -> Result<Vec<Block>> {
        self.require_namespace(namespace_id).await?;

        let blocks: Vec<Block> = blocks
            .into_iter()
            .map(|b| Block::from_new(namespace_id, b, None))
            .collect();
        if blocks.is_empty() {
            return Ok(blocks);
        }

        self.blocks.insert_many(&blocks).await?;
        for block in &blocks {
            self.record(namespace_id, OBJECT_FILE, &block.id, TxnCommand::Insert, &block.to_ref()).await?;
        }
        Ok(blocks)
    }

    async fn list_webhooks(&self, namespace_id: &str) -> Result<Vec<Webhook>> {
        Self::find_all(&self.webhooks, doc! { "namespace_id": namespace_id }).await
    }

    async fn get_webhook(&self, namespace_id: &str, webhook_id: &str) -> Result<Option<Webhook>> {
        Ok(self
            .webhooks
            .find_one(doc! { "namespace_id": namespace_id, "id": webhook_id })
            .await?)
    }

    async fn create_webhook(&self, namespace_id: &str, new: NewWebhook) -> Result<Webhook> {
        self.require_namespace(namespace_id).await?;

        let webhook = Webhook {
            id: crate::public_id::generate(),
            namespace_id: namespace_id.to_string(),
            callback_url: new.callback_url,
            failure_notify_url: new.failure_notify_url,
            include_body: new.include_body,
            active: new.active,
            min_processed_id: self.current_seq().await?,
            filters: new.filters,
            created_at: Utc::now(),
        };
        self.webhooks.insert_one(&webhook).await?;
        self.record(namespace_id, OBJECT_WEBHOOK, &webhook.id, TxnCommand::Insert, &webhook).await?;
        Ok(webhook)
    }

    async fn set_webhook_active(&self, webhook_id: &str, active: bool) -> Result<Webhook> {
        let mut webhook = self
            .webhooks
            .find_one(doc! { "id": webhook_id })
            .await?
            .ok_or_else(|| PersistError::WebhookNotFound(webhook_id.to_string()))?;

        webhook.active = active;
        self.webhooks
            .replace_one(doc! { "id": webhook_id }, &webhook)
            .await?;
        self.record(&webhook.namespace_id, OBJECT_WEBHOOK, &webhook.id, TxnCommand::Update, &webhook).await?;
        Ok(webhook)
    }

    async fn list_drafts(&self, namespace_id: &str) -> Result<Vec<Draft>> {
        let filter = doc! {
            "namespace_id": namespace_id,
            "most_recent_revision_id": null,
            "state": { "$ne": "sent" },
        };
        Self::find_all(&self.drafts, filter).await
    }

    async fn get_draft(&self, namespace_id: &str, draft_id: &str) -> Result<Option<Draft>> {
        Ok(self
            .drafts
            .find_one(doc! { "namespace_id": namespace_id, "id": draft_id })
            .await?)
    }

    async fn create_draft(&self, namespace_id: &str, new: NewDraft) -> Result<Draft> {
        self.require_namespace(namespace_id).await?;

        let (mut thread, command) = match new.reply_to_thread.as_deref() {
            Some(thread_id) => (self.require_thread(namespace_id, thread_id).await?, TxnCommand::Update),
            None => (Thread::new(namespace_id, new.subject.clone(), Utc::now()), TxnCommand::Insert),
        };

        let draft = Draft::from_new(namespace_id, &thread.id, &new);
        common::attach_draft(&mut thread, &draft, &new.tags);

        self.drafts.insert_one(&draft).await?;
        self.record(namespace_id, OBJECT_DRAFT, &draft.id, TxnCommand::Insert, &draft).await?;
        self.save_thread(&thread, command).await?;
        Ok(draft)
    }

    async fn update_draft(&self, namespace_id: &str, parent_id: &str, update: DraftUpdate) -> Result<Draft> {
        let parent = self.require_draft(namespace_id, parent_id).await?;
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
        self.drafts
            .update_many(
                doc! { "namespace_id": namespace_id, "root_id": parent.root_id.as_str() },
                doc! { "$set": { "most_recent_revision_id": child.id.as_str() } },
            )
            .await?;
        self.drafts.insert_one(&child).await?;

        let mut thread = self.require_thread(namespace_id, &parent.thread_id).await?;
        common::replace_draft(&mut thread, &parent, &child, &update.tags);

        self.record(namespace_id, OBJECT_DRAFT, &child.id, TxnCommand::Insert, &child).await?;
        self.save_thread(&thread, TxnCommand::Update).await?;
        Ok(child)
    }

    async fn delete_draft(&self, namespace_id: &str, draft_id: &str) -> Result<Draft> {
        let draft = self.require_draft(namespace_id, draft_id).await?;
        if !draft.is_draft() {
            return Err(PersistError::NotADraft(draft.id));
        }

        let chain_filter = doc! { "namespace_id": namespace_id, "root_id": draft.root_id.as_str() };
        let chain = Self::find_all(&self.drafts, chain_filter.clone()).await?;
        self.drafts.delete_many(chain_filter).await?;
        for revision in &chain {
            self.record(namespace_id, OBJECT_DRAFT, &revision.id, TxnCommand::Delete, revision).await?;
        }

        if let Some(mut thread) = self.get_thread(namespace_id, &draft.thread_id).await? {
            let chain_ids: Vec<String> = chain.iter().map(|d| d.id.clone()).collect();
            let command = if common::detach_drafts(&mut thread, &chain_ids) {
                TxnCommand::Delete
            } else {
                TxnCommand::Update
            };
            self.save_thread(&thread, command).await?;
        }
        Ok(draft)
    }

    async fn mark_draft_sending(&self, namespace_id: &str, draft_id: &str) -> Result<Draft> {
        let mut draft = self.require_draft(namespace_id, draft_id).await?;
        if !draft.is_draft() {
            return Err(PersistError::NotADraft(draft.id));
        }

        draft.state = DraftState::Sending;
        draft.updated_at = Utc::now();
        self.drafts
            .replace_one(doc! { "id": draft.id.as_str() }, &draft)
            .await?;

        if let Some(mut thread) = self.get_thread(namespace_id, &draft.thread_id).await? {
            if thread.apply_tag(&TagRef::canonical("sending")) {
                self.save_thread(&thread, TxnCommand::Update).await?;
            }
        }
        self.record(namespace_id, OBJECT_DRAFT, &draft.id, TxnCommand::Update, &draft).await?;
        Ok(draft)
    }

    async fn stamp_from_timestamp(&self, namespace_id: &str, at: DateTime<Utc>) -> Result<String> {
        let latest = self
            .transactions
            .find_one(doc! { "namespace_id": namespace_id, "timestamp": { "$lte": at.timestamp() } })
            .sort(doc! { "seq": -1 })
            .await?;
        Ok(latest
            .map(|t| t.id)
            .unwrap_or_else(|| START_STAMP.to_string()))
    }

    async fn events_from_stamp(&self, namespace_id: &str, stamp: &str, limit: usize) -> Result<Vec<Transaction>> {
        let start_seq = if stamp == START_STAMP {
            0
        } else {
            self.transactions
                .find_one(doc! { "namespace_id": namespace_id, "id": stamp })
                .await?
                .map(|t| t.seq)
                .ok_or_else(|| PersistError::InvalidStamp(stamp.to_string()))?
        };

        let events = self
            .transactions
            .find(doc! { "namespace_id": namespace_id, "seq": { "$gt": start_seq } })
            .sort(doc! { "seq": 1 })
            .limit(limit as i64)
            .await?
            .try_collect()
            .await?;
        Ok(events)
    }
}
