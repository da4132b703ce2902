// Uniform tool result envelopes: success payloads and the failure JSON

use crate::protocol::{CallToolResult, ToolContent};
use readwise_mcp_core::{ErrorKind, GatewayError};
use serde_json::{json, Value};

/// Wrap a successful payload as MCP text content.
pub fn success(payload: Value) -> CallToolResult {
    CallToolResult {
        content: vec![ToolContent::text(payload.to_string())],
        is_error: None,
    }
}

/// Wrap a gateway error as the uniform failure JSON.
///
/// Every failed call reports the same shape: `kind`, a gateway-built
/// `message`, `retryable`, and `retry_after_secs` when the backend
/// supplied a hint.
pub fn failure(error: &GatewayError) -> CallToolResult {
    let mut body = json!({
        "kind": error.kind(),
        "message": error.to_string(),
        "retryable": error.is_retryable(),
    });
    if let Some(secs) = error.retry_after_secs() {
        body["retry_after_secs"] = json!(secs);
    }
    error_result(body)
}

/// Failure for tool arguments that did not deserialize.
pub fn invalid_args(error: &serde_json::Error) -> CallToolResult {
    failure(&GatewayError::InvalidParameters(format!(
        "invalid arguments: {error}"
    )))
}

/// Report a fetch-all walk that stopped partway through.
///
/// Collected records ride along under `partial` so the caller keeps what
/// was fetched, but the result is still an error: it must never read as
/// a complete success. An interruption before anything was collected is
/// reported as the plain cause.
pub fn interrupted(records: Vec<Value>, cause: &GatewayError) -> CallToolResult {
    if records.is_empty() {
        return failure(cause);
    }
    let mut body = json!({
        "kind": ErrorKind::PartialResult,
        "message": format!("fetch stopped after {} records: {}", records.len(), cause),
        "retryable": cause.is_retryable(),
        "cause": cause.kind(),
        "partial": {
            "count": records.len(),
            "records": records,
        },
    });
    if let Some(secs) = cause.retry_after_secs() {
        body["retry_after_secs"] = json!(secs);
    }
    error_result(body)
}

fn error_result(body: Value) -> CallToolResult {
    CallToolResult {
        content: vec![ToolContent::text(json!({ "error": body }).to_string())],
        is_error: Some(true),
    }
}

#[cfg(test)]
pub(crate) fn result_json(result: &CallToolResult) -> Value {
    let ToolContent::Text { text } = &result.content[0];
    serde_json::from_str(text).unwrap()
}
