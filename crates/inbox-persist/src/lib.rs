pub mod dbs;
pub mod error;
pub mod filter;
pub mod models;
pub mod public_id;
pub mod trait_client;

pub use dbs::memory::MemoryPersistenceClient;
#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoPersistenceClient;
pub use error::PersistError;
pub use filter::{Filter, FilterParams, OrderBy};
pub use models::{
    Address, Block, Contact, ContactSource, Draft, DraftState, DraftUpdate, FileRef, Message,
    Namespace, NewBlock, NewDraft, NewMessage, NewWebhook, Tag, TagRef, Thread, Transaction,
    TxnCommand, Webhook, WebhookFilters, MAX_INDEXABLE_LENGTH, OBJECT_CONTACT, OBJECT_DRAFT,
    OBJECT_FILE, OBJECT_MESSAGE, OBJECT_NAMESPACE, OBJECT_TAG, OBJECT_THREAD, OBJECT_WEBHOOK,
    START_STAMP,
};
pub use trait_client::PersistenceClient;
