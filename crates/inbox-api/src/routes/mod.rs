pub mod contacts;
pub mod drafts;
pub mod events;
pub mod files;
pub mod home;
pub mod messages;
pub mod namespace;
pub mod sync;
pub mod tags;
pub mod threads;
pub mod webhooks;
