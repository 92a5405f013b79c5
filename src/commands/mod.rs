//! CLI commands implementation

pub mod ask;
pub mod ingest;
pub mod status;

pub use ask::*;
pub use ingest::*;
pub use status::*;
