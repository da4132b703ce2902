use crate::config::AppState;
use crate::middleware::auth;
use anyhow::Result;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use readwise_mcp::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use serde_json::Value;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Start the gateway server
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("gateway listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the gateway router
///
/// `/health` sits outside the auth gate; the MCP endpoint is behind it.
pub fn create_router(state: AppState) -> Router {
    let gated = Router::new()
        .route("/mcp", post(handle_mcp))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(gated)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    let origins = [
        HeaderValue::from_static("https://claude.ai"),
        HeaderValue::from_static("https://claude.com"),
    ];
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Health endpoint, also reporting whether inbound auth is active.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": readwise_mcp::SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "authentication": state.auth.label(),
    }))
}

/// The MCP endpoint: one JSON-RPC request per POST.
async fn handle_mcp(State(state): State<AppState>, body: String) -> Response {
    let raw: Value = match serde_json::from_str(&body) {
        Ok(raw) => raw,
        Err(_) => {
            let response = JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error());
            return Json(response).into_response();
        }
    };

    let request: JsonRpcRequest = match serde_json::from_value(raw) {
        Ok(request) => request,
        Err(_) => {
            let response = JsonRpcResponse::error(Value::Null, JsonRpcError::invalid_request());
            return Json(response).into_response();
        }
    };

    match state.dispatcher.dispatch(request).await {
        Some(response) => Json(response).into_response(),
        // Notifications get no body, only an acknowledgement.
        None => StatusCode::ACCEPTED.into_response(),
    }
}
