//! MCP (Model Context Protocol) Server Module
//!
//! Exposes video search to AI clients over stdio using JSON-RPC 2.0.
//!
//! ## Usage
//!
//! ```bash
//! vidsearch serve --index data/index.bin --watch
//! ```

pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;
pub mod transport;

pub use protocol::*;
pub use server::McpServer;
