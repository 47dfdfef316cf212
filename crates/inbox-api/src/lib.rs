pub mod config;
pub mod encoding;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod mime;
pub mod openapi;
pub mod router;
pub mod routes;
pub mod state;
pub mod validation;

pub use router::build_router;
