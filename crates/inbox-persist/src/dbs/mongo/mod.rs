pub mod client;

pub use client::MongoPersistenceClient;
