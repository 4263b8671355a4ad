//! vidsearch server library
//!
//! Command-line ingestion and index building, plus an MCP server that answers
//! video search queries against a hot-reloadable index artifact.

pub mod error;
pub mod ingest;
pub mod mcp;
pub mod retrieval;
pub mod watcher;

pub use error::{ServerError, ServerResult};
pub use retrieval::RetrievalManager;
pub use watcher::IndexWatcher;
