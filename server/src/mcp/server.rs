//! MCP Server Implementation
//!
//! Handles MCP protocol requests and routes them to the retrieval manager.

use super::protocol::*;
use super::resources::{get_all_resources, read_resource};
use super::tools::{get_all_tools, INDEX_STATS_TOOL, SEARCH_TOOL};
use super::transport::{AsyncStdioTransport, Incoming, LineTransport};
use crate::error::{ServerError, ServerResult};
use crate::retrieval::RetrievalManager;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite};

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "vidsearch";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP Server - handles protocol messages
pub struct McpServer {
    manager: Arc<RetrievalManager>,
}

impl McpServer {
    pub fn new(manager: Arc<RetrievalManager>) -> Self {
        Self { manager }
    }

    /// Run the MCP server on stdin/stdout until the client disconnects
    pub async fn run_stdio(&self) -> std::io::Result<()> {
        self.run(AsyncStdioTransport::stdio()).await
    }

    /// Run the MCP server event loop
    pub async fn run<R, W>(&self, mut transport: LineTransport<R, W>) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!("MCP server starting...");

        loop {
            match transport.read_request().await? {
                Incoming::Request(request) => {
                    if let Some(response) = self.handle_request(request).await {
                        transport.write_response(&response).await?;
                    }
                }
                Incoming::Malformed(e) => {
                    let response = JsonRpcResponse::error(
                        None,
                        JsonRpcError::parse_error(format!("Parse error: {}", e)),
                    );
                    transport.write_response(&response).await?;
                }
                Incoming::Invalid { id, reason } => {
                    let response = JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_request(format!("Invalid request: {}", reason)),
                    );
                    transport.write_response(&response).await?;
                }
                Incoming::Blank => continue,
                Incoming::Eof => {
                    tracing::info!("Client disconnected");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle a JSON-RPC request; notifications yield no response
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        tracing::debug!("Handling request: {}", request.method);

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_request("jsonrpc must be \"2.0\""),
            ));
        }

        if request.is_notification() {
            tracing::debug!("Notification: {}", request.method);
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id, request.params),
            "ping" => JsonRpcResponse::success(request.id, Value::Object(Default::default())),
            "tools/list" => JsonRpcResponse::from_result(
                request.id,
                &ToolsListResult {
                    tools: get_all_tools(),
                },
            ),
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            "resources/list" => JsonRpcResponse::from_result(
                request.id,
                &ResourcesListResult {
                    resources: get_all_resources(),
                },
            ),
            "resources/read" => self.handle_resources_read(request.id, request.params).await,
            _ => {
                JsonRpcResponse::error(request.id, JsonRpcError::method_not_found(&request.method))
            }
        };
        Some(response)
    }

    fn handle_initialize(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: InitializeParams = params
            .map(|p| serde_json::from_value(p).unwrap_or_default())
            .unwrap_or_default();

        if let Some(client) = &params.client_info {
            tracing::info!(
                "Client connected: {} {} (protocol {})",
                client.name,
                client.version.as_deref().unwrap_or("?"),
                params.protocol_version.as_deref().unwrap_or("?")
            );
        }

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION,
            capabilities: ServerCapabilities {
                resources: Capability {
                    subscribe: Some(false),
                    list_changed: false,
                },
                tools: Capability::default(),
            },
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: Some(SERVER_VERSION.to_string()),
            },
        };

        JsonRpcResponse::from_result(id, &result)
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_params(format!("Invalid params: {}", e)),
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing params"));
            }
        };

        match self.execute_tool(&params.name, params.arguments).await {
            Ok(result) => {
                let text =
                    serde_json::to_string_pretty(&result).unwrap_or_else(|_| result.to_string());
                JsonRpcResponse::from_result(id, &ToolCallResult::text(text))
            }
            // bad arguments are the caller's fault and fail the request itself
            Err(e) if is_caller_error(&e) => JsonRpcResponse::error(id, e.into()),
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", params.name, e);
                let hint = if e.is_retryable() {
                    " (retryable)"
                } else {
                    ""
                };
                let failure = ToolCallResult::failure(format!("Error: {}{}", e, hint));
                JsonRpcResponse::from_result(id, &failure)
            }
        }
    }

    async fn handle_resources_read(
        &self,
        id: Option<Value>,
        params: Option<Value>,
    ) -> JsonRpcResponse {
        let params: ResourceReadParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_params(format!("Invalid params: {}", e)),
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing params"));
            }
        };

        match read_resource(&params.uri, &self.manager).await {
            Some(result) => JsonRpcResponse::from_result(id, &result),
            None => JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_params(format!("Unknown resource: {}", params.uri)),
            ),
        }
    }

    async fn execute_tool(&self, name: &str, arguments: Option<Value>) -> ServerResult<Value> {
        let args = arguments.unwrap_or(Value::Object(Default::default()));

        match name {
            SEARCH_TOOL => {
                let query = args
                    .get("query")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| ServerError::invalid_params("Missing 'query' parameter"))?;
                let limit = match args.get("limit") {
                    None | Some(Value::Null) => None,
                    Some(v) => Some(v.as_u64().map(|v| v as usize).ok_or_else(|| {
                        ServerError::invalid_params("'limit' must be a non-negative integer")
                    })?),
                };
                let include_distance = args
                    .get("includeDistance")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);

                let results = self.manager.search_scored(query, limit).await?;

                let results_json: Vec<Value> = results
                    .iter()
                    .map(|r| {
                        if include_distance {
                            serde_json::json!({
                                "videoId": r.video_id,
                                "title": r.title,
                                "distance": r.distance,
                                "matched": r.matched,
                            })
                        } else {
                            serde_json::json!({
                                "videoId": r.video_id,
                                "title": r.title,
                            })
                        }
                    })
                    .collect();

                Ok(serde_json::json!({
                    "results": results_json,
                    "total": results.len()
                }))
            }

            INDEX_STATS_TOOL => Ok(serde_json::to_value(self.manager.stats().await)
                .map_err(|e| ServerError::Io(e.into()))?),

            _ => Err(ServerError::UnknownTool(name.to_string())),
        }
    }
}

fn is_caller_error(err: &ServerError) -> bool {
    match err {
        ServerError::InvalidParams(_) | ServerError::UnknownTool(_) => true,
        ServerError::Search(e) => e.is_input_error(),
        _ => false,
    }
}
