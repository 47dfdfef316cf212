mod address;
mod block;
mod contact;
mod draft;
mod message;
mod namespace;
mod tag;
mod thread;
mod transaction;
mod webhook;

pub use address::Address;
pub use block::{Block, FileRef, NewBlock};
pub use contact::{rank_search, Contact, ContactSource};
pub use draft::{Draft, DraftState, DraftUpdate, NewDraft};
pub use message::{snippet, Message, NewMessage};
pub use namespace::Namespace;
pub use tag::{is_reserved_name, Tag, TagRef, CANONICAL_TAG_NAMES, MAX_INDEXABLE_LENGTH};
pub use thread::Thread;
pub use transaction::{
    Transaction, TxnCommand, OBJECT_CONTACT, OBJECT_DRAFT, OBJECT_FILE, OBJECT_MESSAGE,
    OBJECT_NAMESPACE, OBJECT_TAG, OBJECT_THREAD, OBJECT_WEBHOOK, START_STAMP,
};
pub use webhook::{NewWebhook, Webhook, WebhookFilters};
