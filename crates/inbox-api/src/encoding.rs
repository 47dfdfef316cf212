//! Public JSON representations of store objects.
//!
//! Every object carries its public `id`, an `object` type name and the
//! public id of its `namespace`. Timestamps are unix seconds.

use inbox_persist::{
    Address, Block, Contact, Draft, DraftState, FileRef, Message, Namespace, Tag, TagRef, Thread,
    Transaction, Webhook, OBJECT_CONTACT, OBJECT_DRAFT, OBJECT_FILE, OBJECT_MESSAGE,
    OBJECT_NAMESPACE, OBJECT_TAG, OBJECT_THREAD, OBJECT_WEBHOOK,
};
use inbox_webhooks::WebhookView;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct AddressView {
    pub name: Option<String>,
    pub email: String,
}

impl From<&Address> for AddressView {
    fn from(addr: &Address) -> Self {
        Self {
            name: addr.name.clone(),
            email: addr.email.clone(),
        }
    }
}

fn addresses(list: &[Address]) -> Vec<AddressView> {
    list.iter().map(AddressView::from).collect()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NamespaceView {
    pub id: String,
    pub object: String,
    pub namespace: String,
    pub account: String,
    pub email_address: String,
    pub provider: String,
}

impl From<&Namespace> for NamespaceView {
    fn from(ns: &Namespace) -> Self {
        Self {
            id: ns.id.clone(),
            object: "namespace".to_string(),
            namespace: ns.id.clone(),
            account: ns.account_id.clone(),
            email_address: ns.email_address.clone(),
            provider: ns.provider.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TagView {
    pub id: String,
    pub object: String,
    pub namespace: String,
    pub name: String,
}

impl From<&Tag> for TagView {
    fn from(tag: &Tag) -> Self {
        Self {
            id: tag.id.clone(),
            object: "tag".to_string(),
            namespace: tag.namespace_id.clone(),
            name: tag.name.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TagRefView {
    pub id: String,
    pub name: String,
}

impl From<&TagRef> for TagRefView {
    fn from(tag: &TagRef) -> Self {
        Self {
            id: tag.id.clone(),
            name: tag.name.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ThreadView {
    pub id: String,
    pub object: String,
    pub namespace: String,
    pub subject: Option<String>,
    pub participants: Vec<AddressView>,
    pub first_message_timestamp: i64,
    pub last_message_timestamp: i64,
    pub snippet: String,
    pub tags: Vec<TagRefView>,
    pub messages: Vec<String>,
    pub drafts: Vec<String>,
}

impl From<&Thread> for ThreadView {
    fn from(thread: &Thread) -> Self {
        Self {
            id: thread.id.clone(),
            object: "thread".to_string(),
            namespace: thread.namespace_id.clone(),
            subject: thread.subject.clone(),
            participants: addresses(&thread.participants),
            first_message_timestamp: thread.first_message_timestamp.timestamp(),
            last_message_timestamp: thread.last_message_timestamp.timestamp(),
            snippet: thread.snippet.clone(),
            tags: thread.tags.iter().map(TagRefView::from).collect(),
            messages: thread.messages.clone(),
            drafts: thread.drafts.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FileView {
    pub id: String,
    pub object: String,
    pub namespace: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
    pub message: Option<String>,
}

impl FileView {
    pub fn from_ref(namespace_id: &str, file: &FileRef) -> Self {
        Self {
            id: file.id.clone(),
            object: "file".to_string(),
            namespace: namespace_id.to_string(),
            filename: file.filename.clone(),
            content_type: file.content_type.clone(),
            size: file.size,
            message: file.message_id.clone(),
        }
    }
}

impl From<&Block> for FileView {
    fn from(block: &Block) -> Self {
        Self::from_ref(&block.namespace_id, &block.to_ref())
    }
}

fn files(namespace_id: &str, list: &[FileRef]) -> Vec<FileView> {
    list.iter().map(|f| FileView::from_ref(namespace_id, f)).collect()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageView {
    pub id: String,
    pub object: String,
    pub namespace: String,
    pub thread: String,
    pub subject: Option<String>,
    pub from: Vec<AddressView>,
    pub to: Vec<AddressView>,
    pub cc: Vec<AddressView>,
    pub bcc: Vec<AddressView>,
    pub date: i64,
    pub body: String,
    pub snippet: String,
    pub unread: bool,
    pub files: Vec<FileView>,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            object: "message".to_string(),
            namespace: message.namespace_id.clone(),
            thread: message.thread_id.clone(),
            subject: message.subject.clone(),
            from: addresses(&message.from),
            to: addresses(&message.to),
            cc: addresses(&message.cc),
            bcc: addresses(&message.bcc),
            date: message.date.timestamp(),
            body: message.body.clone(),
            snippet: message.snippet.clone(),
            unread: !message.is_read,
            files: files(&message.namespace_id, &message.files),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DraftView {
    pub id: String,
    pub object: String,
    pub namespace: String,
    pub thread: String,
    pub subject: Option<String>,
    pub to: Vec<AddressView>,
    pub cc: Vec<AddressView>,
    pub bcc: Vec<AddressView>,
    pub date: i64,
    pub body: String,
    pub files: Vec<FileView>,
    pub state: String,
    pub reply_to_thread: Option<String>,
    pub parent_draft: Option<String>,
}

impl From<&Draft> for DraftView {
    fn from(draft: &Draft) -> Self {
        Self {
            id: draft.id.clone(),
            object: "draft".to_string(),
            namespace: draft.namespace_id.clone(),
            thread: draft.thread_id.clone(),
            subject: draft.subject.clone(),
            to: addresses(&draft.to),
            cc: addresses(&draft.cc),
            bcc: addresses(&draft.bcc),
            date: draft.updated_at.timestamp(),
            body: draft.body.clone(),
            files: files(&draft.namespace_id, &draft.files),
            state: match draft.state {
                DraftState::Draft => "draft",
                DraftState::Sending => "sending",
                DraftState::Sent => "sent",
            }
            .to_string(),
            reply_to_thread: draft.reply_to_thread_id.clone(),
            parent_draft: draft.parent_draft_id.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContactView {
    pub id: String,
    pub object: String,
    pub namespace: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl From<&Contact> for ContactView {
    fn from(contact: &Contact) -> Self {
        Self {
            id: contact.id.clone(),
            object: "contact".to_string(),
            namespace: contact.namespace_id.clone(),
            name: contact.name.clone(),
            email: contact.email.clone(),
        }
    }
}

/// One change in the sync log
#[derive(Debug, Serialize, ToSchema)]
pub struct EventView {
    pub object: String,
    pub id: String,
    /// `create`, `modify` or `delete`
    pub event: String,
    #[schema(value_type = Object)]
    pub attributes: Value,
    pub stamp: String,
    pub timestamp: i64,
}

fn reencode<T, V>(snapshot: &Value, view: impl FnOnce(&T) -> V) -> serde_json::Result<Value>
where
    T: DeserializeOwned,
    V: Serialize,
{
    let object: T = serde_json::from_value(snapshot.clone())?;
    serde_json::to_value(view(&object))
}

/// The logged object in the same shape its GET endpoint returns
fn public_attributes(txn: &Transaction) -> Value {
    let snapshot = &txn.snapshot;
    let encoded = match txn.object_type.as_str() {
        OBJECT_NAMESPACE => reencode(snapshot, |n: &Namespace| NamespaceView::from(n)),
        OBJECT_TAG => reencode(snapshot, |t: &Tag| TagView::from(t)),
        OBJECT_THREAD => reencode(snapshot, |t: &Thread| ThreadView::from(t)),
        OBJECT_MESSAGE => reencode(snapshot, |m: &Message| MessageView::from(m)),
        OBJECT_DRAFT => reencode(snapshot, |d: &Draft| DraftView::from(d)),
        OBJECT_CONTACT => reencode(snapshot, |c: &Contact| ContactView::from(c)),
        OBJECT_FILE => reencode(snapshot, |f: &FileRef| {
            FileView::from_ref(&txn.namespace_id, f)
        }),
        OBJECT_WEBHOOK => reencode(snapshot, |w: &Webhook| WebhookView::from(w)),
        other => {
            tracing::warn!(object_type = other, "Unknown object type in sync log");
            return Value::Null;
        }
    };

    encoded.unwrap_or_else(|e| {
        tracing::warn!(
            object_type = %txn.object_type,
            object_id = %txn.object_id,
            error = %e,
            "Failed to re-encode sync log snapshot"
        );
        Value::Null
    })
}

impl From<&Transaction> for EventView {
    fn from(txn: &Transaction) -> Self {
        Self {
            object: txn.object_type.clone(),
            id: txn.object_id.clone(),
            event: txn.command.event_name().to_string(),
            attributes: public_attributes(txn),
            stamp: txn.id.clone(),
            timestamp: txn.timestamp,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SyncEventsView {
    pub events: Vec<EventView>,
    pub stamp_start: String,
    pub stamp_end: String,
    pub count: usize,
}

impl SyncEventsView {
    pub fn new(stamp_start: &str, transactions: &[Transaction]) -> Self {
        let stamp_end = transactions
            .last()
            .map(|t| t.id.clone())
            .unwrap_or_else(|| stamp_start.to_string());
        Self {
            events: transactions.iter().map(EventView::from).collect(),
            stamp_start: stamp_start.to_string(),
            stamp_end,
            count: transactions.len(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StampView {
    pub stamp: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessView {
    pub success: bool,
}

/// Encode a list with a per-item view
pub fn list<'a, T: 'a, V>(items: impl IntoIterator<Item = &'a T>) -> Vec<V>
where
    V: From<&'a T>,
{
    items.into_iter().map(V::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use inbox_persist::{NewMessage, TxnCommand};

    #[test]
    fn test_message_view_inverts_read_flag() {
        let message = Message::from_new(
            "ns",
            "thread",
            &NewMessage {
                subject: Some("Hi".into()),
                is_read: true,
                ..Default::default()
            },
            Vec::new(),
        );
        let json = serde_json::to_value(MessageView::from(&message)).unwrap();
        assert_eq!(json["object"], "message");
        assert_eq!(json["unread"], false);
        assert_eq!(json["thread"], "thread");
    }

    #[test]
    fn test_sync_view_without_events_keeps_stamp() {
        let view = SyncEventsView::new("0", &[]);
        assert_eq!(view.stamp_end, "0");
        assert_eq!(view.count, 0);

        let txn = Transaction::new(1, "ns", "tag", "t1", TxnCommand::Update, serde_json::json!({}));
        let view = SyncEventsView::new("0", std::slice::from_ref(&txn));
        assert_eq!(view.stamp_end, txn.id);
        assert_eq!(view.events[0].event, "modify");
    }

    #[test]
    fn test_event_attributes_use_public_view() {
        let message = Message::from_new(
            "ns",
            "thread",
            &NewMessage {
                subject: Some("Hi".into()),
                ..Default::default()
            },
            Vec::new(),
        );
        let snapshot = serde_json::to_value(&message).unwrap();
        let txn = Transaction::new(1, "ns", OBJECT_MESSAGE, &message.id, TxnCommand::Insert, snapshot);

        let event = EventView::from(&txn);
        let expected = serde_json::to_value(MessageView::from(&message)).unwrap();
        assert_eq!(event.attributes, expected);
        assert!(event.attributes.get("is_read").is_none());
        assert!(event.attributes.get("namespace_id").is_none());
    }

    #[test]
    fn test_unreadable_snapshot_has_no_attributes() {
        let txn = Transaction::new(1, "ns", OBJECT_TAG, "t1", TxnCommand::Insert, serde_json::json!({}));
        assert_eq!(EventView::from(&txn).attributes, Value::Null);

        let txn = Transaction::new(1, "ns", "gadget", "g1", TxnCommand::Insert, serde_json::json!({}));
        assert_eq!(EventView::from(&txn).attributes, Value::Null);
    }
}
