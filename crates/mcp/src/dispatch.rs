// JSON-RPC dispatch for the MCP endpoint

use crate::protocol::{
    CallToolParams, InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo, ToolsCapability,
    PROTOCOL_VERSION,
};
use crate::tools::ToolRegistry;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Server identity reported during initialization.
pub const SERVER_NAME: &str = "readwise-mcp";

/// Routes JSON-RPC requests to protocol handlers and registered tools.
///
/// Tool failures travel inside a `CallToolResult` with `is_error` set;
/// JSON-RPC errors are reserved for breakage of the protocol itself
/// (unparseable params, unknown methods, unknown tools).
pub struct McpDispatcher {
    registry: Arc<ToolRegistry>,
}

impl McpDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one request. Notifications produce no response.
    pub async fn dispatch(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != "2.0" {
            let id = request.id.unwrap_or(Value::Null);
            return Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request()));
        }

        if request.method == "notifications/initialized" {
            info!("client reported initialized");
            return None;
        }

        // Any other id-less request is a notification we have nothing
        // to say to.
        let id = request.id?;
        Some(self.call(id, &request.method, request.params).await)
    }

    async fn call(&self, id: Value, method: &str, params: Option<Value>) -> JsonRpcResponse {
        match method {
            "initialize" => self.initialize(id, params),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(
                id,
                ListToolsResult {
                    tools: self.registry.list_schemas(),
                },
            ),
            "tools/call" => self.call_tool(id, params).await,
            other => JsonRpcResponse::error(id, JsonRpcError::method_not_found(other)),
        }
    }

    fn initialize(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        if let Some(params) = params {
            if let Ok(params) = serde_json::from_value::<InitializeParams>(params) {
                info!(
                    client = %params.client_info.name,
                    client_version = %params.client_info.version,
                    protocol = %params.protocol_version,
                    "initialize"
                );
            }
        }
        JsonRpcResponse::success(
            id,
            InitializeResult {
                protocol_version: PROTOCOL_VERSION.to_string(),
                capabilities: ServerCapabilities {
                    tools: Some(ToolsCapability {
                        list_changed: false,
                    }),
                },
                server_info: ServerInfo {
                    name: SERVER_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
            },
        )
    }

    async fn call_tool(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let Some(params) = params else {
            return JsonRpcResponse::error(id, JsonRpcError::invalid_params("missing params"));
        };
        let params: CallToolParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(error) => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(format!("invalid params: {error}")),
                )
            }
        };

        let Some(tool) = self.registry.get(&params.name) else {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name)),
            );
        };

        let trace_id = Uuid::new_v4();
        info!(tool = %params.name, %trace_id, "tool call");

        let arguments = if params.arguments.is_null() {
            json!({})
        } else {
            params.arguments
        };

        match tool.execute(arguments).await {
            Ok(result) => {
                if result.is_error.unwrap_or(false) {
                    warn!(tool = %params.name, %trace_id, "tool call failed");
                }
                JsonRpcResponse::success(id, result)
            }
            Err(error) => {
                warn!(tool = %params.name, %trace_id, error = %error, "tool execution error");
                JsonRpcResponse::error(id, JsonRpcError::internal_error("tool execution failed"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::default_registry;
    use readwise_mcp_client::{ReadwiseClient, RetryPolicy};
    use readwise_mcp_core::shape::ShapeConfig;

    // Client pointed at a dead address; tests here never reach the
    // network.
    fn dispatcher() -> McpDispatcher {
        let client = Arc::new(
            ReadwiseClient::builder()
                .base_url("http://127.0.0.1:9")
                .token("test-token")
                .retry(RetryPolicy::no_retry())
                .build()
                .unwrap(),
        );
        McpDispatcher::new(Arc::new(default_registry(client, ShapeConfig::default())))
    }

    #[tokio::test]
    async fn initialize_reports_server_identity() {
        let dispatcher = dispatcher();
        let request = JsonRpcRequest::new(
            1,
            "initialize",
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test-client", "version": "0.1.0"}
            }),
        );

        let response = dispatcher.dispatch(request).await.unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "readwise-mcp");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
    }

    #[tokio::test]
    async fn tools_list_exposes_all_thirteen_sorted() {
        let dispatcher = dispatcher();
        let request = JsonRpcRequest::new(2, "tools/list", json!({}));

        let response = dispatcher.dispatch(request).await.unwrap();
        let result = response.result.unwrap();
        let names: Vec<&str> = result["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|tool| tool["name"].as_str().unwrap())
            .collect();

        assert_eq!(
            names,
            vec![
                "readwise_create_highlight",
                "readwise_delete_document",
                "readwise_export_highlights",
                "readwise_get_book_highlights",
                "readwise_get_daily_review",
                "readwise_list_books",
                "readwise_list_documents",
                "readwise_list_highlights",
                "readwise_list_tags",
                "readwise_save_document",
                "readwise_search_highlights",
                "readwise_topic_search",
                "readwise_update_document",
            ]
        );
    }

    #[tokio::test]
    async fn unknown_method_is_rejected() {
        let dispatcher = dispatcher();
        let request = JsonRpcRequest::new(3, "resources/list", json!({}));

        let response = dispatcher.dispatch(request).await.unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, -32601);
        assert!(error.message.contains("resources/list"));
    }

    #[tokio::test]
    async fn ping_answers_with_empty_object() {
        let dispatcher = dispatcher();
        let request = JsonRpcRequest::new(4, "ping", json!({}));

        let response = dispatcher.dispatch(request).await.unwrap();
        assert_eq!(response.result.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let dispatcher = dispatcher();
        assert!(dispatcher
            .dispatch(JsonRpcRequest::notification(
                "notifications/initialized",
                json!({})
            ))
            .await
            .is_none());
        assert!(dispatcher
            .dispatch(JsonRpcRequest::notification(
                "notifications/cancelled",
                json!({})
            ))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn malformed_call_params_is_invalid_params() {
        let dispatcher = dispatcher();

        let missing = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(5)),
            method: "tools/call".to_string(),
            params: None,
        };
        let response = dispatcher.dispatch(missing).await.unwrap();
        assert_eq!(response.error.unwrap().code, -32602);

        let wrong_shape = JsonRpcRequest::new(6, "tools/call", json!({"na": "x"}));
        let response = dispatcher.dispatch(wrong_shape).await.unwrap();
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn unknown_tool_is_invalid_params() {
        let dispatcher = dispatcher();
        let request = JsonRpcRequest::new(
            7,
            "tools/call",
            json!({"name": "readwise_nope", "arguments": {}}),
        );

        let response = dispatcher.dispatch(request).await.unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, -32602);
        assert!(error.message.contains("Unknown tool: readwise_nope"));
    }

    #[tokio::test]
    async fn wrong_jsonrpc_version_is_invalid_request() {
        let dispatcher = dispatcher();
        let request = JsonRpcRequest {
            jsonrpc: "1.0".to_string(),
            id: Some(json!(8)),
            method: "ping".to_string(),
            params: None,
        };

        let response = dispatcher.dispatch(request).await.unwrap();
        assert_eq!(response.error.unwrap().code, -32600);
    }

    #[tokio::test]
    async fn tool_validation_failure_stays_inside_the_result() {
        let dispatcher = dispatcher();
        let request = JsonRpcRequest::new(
            9,
            "tools/call",
            json!({"name": "readwise_create_highlight", "arguments": {}}),
        );

        let response = dispatcher.dispatch(request).await.unwrap();
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        let body: Value =
            serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(body["error"]["kind"], "invalid_parameters");
    }

    #[tokio::test]
    async fn null_arguments_are_treated_as_empty() {
        let dispatcher = dispatcher();
        let request = JsonRpcRequest::new(
            10,
            "tools/call",
            json!({"name": "readwise_list_tags", "arguments": null}),
        );

        // Reaches the dead backend and fails there, not on arguments.
        let response = dispatcher.dispatch(request).await.unwrap();
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        let body: Value =
            serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(body["error"]["kind"], "backend_unavailable");
    }
}
