use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::config::{AppState, AuthMode};

/// Gate in front of the MCP endpoint.
///
/// In bearer mode the presented token must match the configured secret
/// exactly; unauthorized requests are answered here and never reach the
/// dispatcher.
pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let AuthMode::Bearer(expected) = &state.auth else {
        return next.run(request).await;
    };

    match bearer_token(&request) {
        Some(presented) if secrets_match(presented, expected) => next.run(request).await,
        _ => unauthorized(),
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    let value = request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    value.strip_prefix("Bearer ")
}

/// Compare without an early exit: the length check and every byte fold
/// into one accumulator.
fn secrets_match(presented: &str, expected: &str) -> bool {
    let presented = presented.as_bytes();
    let expected = expected.as_bytes();

    let mut diff = presented.len() ^ expected.len();
    for (i, &byte) in expected.iter().enumerate() {
        let other = presented.get(i).copied().unwrap_or(0);
        diff |= usize::from(other ^ byte);
    }
    diff == 0
}

fn unauthorized() -> Response {
    let body = json!({
        "error": {
            "kind": "unauthorized",
            "message": "missing or invalid bearer token",
            "retryable": false,
        }
    });
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
