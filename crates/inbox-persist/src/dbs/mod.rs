pub(crate) mod common;
pub mod memory;

#[cfg(feature = "mongodb")]
pub mod mongo;
