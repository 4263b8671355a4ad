//! MCP Transport Layer
//!
//! Line-delimited JSON-RPC 2.0 over any async reader/writer pair; stdio in
//! production.

use super::protocol::{JsonRpcRequest, JsonRpcResponse};
use serde_json::Value;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// One line read from the client
#[derive(Debug)]
pub enum Incoming {
    Request(JsonRpcRequest),
    /// Line that is not valid JSON
    Malformed(String),
    /// Valid JSON that is not a JSON-RPC request; carries the id when one was given
    Invalid { id: Option<Value>, reason: String },
    Blank,
    Eof,
}

/// Async line transport for MCP
pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
}

/// Transport bound to the process's stdin and stdout
pub type AsyncStdioTransport = LineTransport<BufReader<tokio::io::Stdin>, tokio::io::Stdout>;

impl AsyncStdioTransport {
    pub fn stdio() -> Self {
        LineTransport::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Read the next JSON-RPC request
    pub async fn read_request(&mut self) -> io::Result<Incoming> {
        let mut line = String::new();
        let bytes_read = self.reader.read_line(&mut line).await?;

        if bytes_read == 0 {
            return Ok(Incoming::Eof);
        }

        let line = line.trim();
        if line.is_empty() {
            return Ok(Incoming::Blank);
        }

        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to parse JSON-RPC message: {}", e);
                return Ok(Incoming::Malformed(e.to_string()));
            }
        };

        let id = value.get("id").cloned();
        match serde_json::from_value(value) {
            Ok(request) => Ok(Incoming::Request(request)),
            Err(e) => {
                tracing::error!("Invalid JSON-RPC request: {}", e);
                Ok(Incoming::Invalid {
                    id,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Write a JSON-RPC response followed by a newline
    pub async fn write_response(&mut self, response: &JsonRpcResponse) -> io::Result<()> {
        let json = serde_json::to_string(response)?;
        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::JsonRpcError;

    #[tokio::test]
    async fn test_read_sequence() {
        let input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n\n{oops\n";
        let mut transport = LineTransport::new(&input[..], Vec::new());

        match transport.read_request().await.unwrap() {
            Incoming::Request(r) => assert_eq!(r.method, "ping"),
            other => panic!("expected request, got {:?}", other),
        }
        assert!(matches!(
            transport.read_request().await.unwrap(),
            Incoming::Blank
        ));
        assert!(matches!(
            transport.read_request().await.unwrap(),
            Incoming::Malformed(_)
        ));
        assert!(matches!(
            transport.read_request().await.unwrap(),
            Incoming::Eof
        ));
    }

    #[tokio::test]
    async fn test_json_without_method_is_invalid_not_malformed() {
        let input = b"{\"jsonrpc\":\"2.0\",\"id\":7}\n[1,2]\n";
        let mut transport = LineTransport::new(&input[..], Vec::new());

        match transport.read_request().await.unwrap() {
            Incoming::Invalid { id, .. } => assert_eq!(id, Some(serde_json::json!(7))),
            other => panic!("expected invalid request, got {:?}", other),
        }
        match transport.read_request().await.unwrap() {
            Incoming::Invalid { id, .. } => assert!(id.is_none()),
            other => panic!("expected invalid request, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_write_is_line_delimited() {
        let mut transport = LineTransport::new(&b""[..], Vec::new());
        let response =
            JsonRpcResponse::error(Some(serde_json::json!(1)), JsonRpcError::method_not_found("x"));
        transport.write_response(&response).await.unwrap();

        let out = String::from_utf8(transport.into_writer()).unwrap();
        assert!(out.ends_with('\n'));
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("-32601"));
    }
}
