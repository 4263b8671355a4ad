//! Error types for the vidsearch server.

use crate::mcp::protocol::{codes, JsonRpcError};
use thiserror::Error;
use vidsearch_core::SearchError;

/// Errors that can occur while serving requests.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::InvalidParams(msg.into())
    }

    /// The same request may succeed later (model warming up, index loading)
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Search(e) if e.is_transient())
    }
}

/// JSON-RPC code for requests that arrive before an index is loaded
pub const NOT_READY_CODE: i32 = -32002;

impl From<ServerError> for JsonRpcError {
    fn from(err: ServerError) -> Self {
        let retryable = err.is_retryable();
        match &err {
            ServerError::InvalidParams(_) | ServerError::UnknownTool(_) => {
                JsonRpcError::invalid_params(err.to_string())
            }
            ServerError::Search(e) if e.is_input_error() => {
                JsonRpcError::invalid_params(err.to_string())
            }
            ServerError::Search(SearchError::NotReady(_)) => {
                JsonRpcError::new(NOT_READY_CODE, err.to_string())
                    .with_data(serde_json::json!({ "retryable": true }))
            }
            _ if retryable => JsonRpcError::internal_error(err.to_string())
                .with_data(serde_json::json!({ "retryable": true })),
            _ => JsonRpcError::new(codes::INTERNAL_ERROR, err.to_string()),
        }
    }
}

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_error_display_is_transparent() {
        let err = ServerError::from(SearchError::invalid_query("query is empty"));
        assert_eq!(err.to_string(), "Invalid query: query is empty");
    }

    #[test]
    fn test_invalid_query_maps_to_invalid_params() {
        let err: JsonRpcError = ServerError::from(SearchError::invalid_query("empty")).into();
        assert_eq!(err.code, -32602);
        assert!(err.message.contains("Invalid query"));
    }

    #[test]
    fn test_not_ready_maps_to_retryable_server_error() {
        let err: JsonRpcError = ServerError::from(SearchError::not_ready("no index")).into();
        assert_eq!(err.code, NOT_READY_CODE);
        assert_eq!(err.data, Some(serde_json::json!({ "retryable": true })));
    }

    #[test]
    fn test_embedding_failure_is_internal_but_retryable() {
        let err = ServerError::from(SearchError::embedding("onnx session lost"));
        assert!(err.is_retryable());
        let rpc: JsonRpcError = err.into();
        assert_eq!(rpc.code, -32603);
        assert!(rpc.data.is_some());
    }

    #[test]
    fn test_corrupt_index_is_not_retryable() {
        let err = ServerError::from(SearchError::corrupt("bad magic"));
        assert!(!err.is_retryable());
        let rpc: JsonRpcError = err.into();
        assert_eq!(rpc.code, -32603);
        assert!(rpc.data.is_none());
    }

    #[test]
    fn test_unknown_tool_is_invalid_params() {
        let rpc: JsonRpcError = ServerError::UnknownTool("nope".into()).into();
        assert_eq!(rpc.code, -32602);
        assert_eq!(rpc.message, "Unknown tool: nope");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        match ServerError::from(io_err) {
            ServerError::Io(_) => {}
            other => panic!("Expected ServerError::Io, got {:?}", other),
        }
    }
}
