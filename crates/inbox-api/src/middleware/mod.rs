pub mod errors;
pub mod logging;
pub mod namespace;

pub use namespace::RequestContext;
