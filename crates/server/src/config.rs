use anyhow::{bail, Context, Result};
use readwise_mcp::tools::default_registry;
use readwise_mcp::McpDispatcher;
use readwise_mcp_client::client::{DEFAULT_BASE_URL, DEFAULT_FETCH_PAGE_SIZE};
use readwise_mcp_client::{ReadwiseClient, RetryPolicy};
use readwise_mcp_core::shape::ShapeConfig;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Inbound authentication state, fixed at startup.
#[derive(Clone)]
pub enum AuthMode {
    /// Callers must present `Authorization: Bearer <secret>`.
    Bearer(String),
    /// Open access, reached only through an explicit opt-in.
    Disabled,
}

impl AuthMode {
    /// Label reported on the health surface.
    pub fn label(&self) -> &'static str {
        match self {
            AuthMode::Bearer(_) => "enabled",
            AuthMode::Disabled => "disabled",
        }
    }
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Bearer(_) => f.write_str("AuthMode::Bearer(***)"),
            AuthMode::Disabled => f.write_str("AuthMode::Disabled"),
        }
    }
}

/// Decide the inbound auth mode from the startup inputs.
///
/// No secret and no opt-in is a startup error; running open must never
/// happen by accident.
pub fn resolve_auth(api_key: Option<String>, allow_authless: bool) -> Result<AuthMode> {
    match api_key {
        Some(secret) if !secret.is_empty() => Ok(AuthMode::Bearer(secret)),
        _ if allow_authless => {
            tracing::warn!("inbound authentication is disabled; every caller is accepted");
            Ok(AuthMode::Disabled)
        }
        _ => bail!("MCP_API_KEY is not set; set it, or pass --allow-authless to serve open"),
    }
}

/// Tunables loadable from an optional TOML settings file.
///
/// Secrets never live here; they come from the environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_field_chars: usize,
    pub fetch_page_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        let shape = ShapeConfig::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            max_retries: retry.max_retries,
            initial_backoff_ms: retry.initial_backoff.as_millis() as u64,
            max_backoff_ms: retry.max_backoff.as_millis() as u64,
            backoff_multiplier: retry.backoff_multiplier,
            max_field_chars: shape.max_field_chars,
            fetch_page_size: DEFAULT_FETCH_PAGE_SIZE,
        }
    }
}

impl ServerConfig {
    /// Load settings from `path` if it exists, otherwise use defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("settings file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse settings file {}", path.display()))
    }

    /// Build the backend client these settings describe.
    pub fn build_client(&self, readwise_token: String) -> Result<ReadwiseClient> {
        ReadwiseClient::builder()
            .base_url(self.base_url.clone())
            .token(readwise_token)
            .timeout(Duration::from_secs(self.timeout_secs))
            .retry(self.retry_policy())
            .fetch_page_size(self.fetch_page_size)
            .build()
            .context("failed to configure the backend client")
    }

    pub fn shape(&self) -> ShapeConfig {
        ShapeConfig {
            max_field_chars: self.max_field_chars,
        }
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            backoff_multiplier: self.backoff_multiplier,
            ..RetryPolicy::default()
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<McpDispatcher>,
    pub auth: AuthMode,
}

impl AppState {
    pub fn new(client: ReadwiseClient, shape: ShapeConfig, auth: AuthMode) -> Self {
        let registry = default_registry(Arc::new(client), shape);
        Self {
            dispatcher: Arc::new(McpDispatcher::new(Arc::new(registry))),
            auth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_requires_explicit_optin() {
        assert!(resolve_auth(None, false).is_err());
        assert!(resolve_auth(Some(String::new()), false).is_err());
        assert!(matches!(
            resolve_auth(None, true),
            Ok(AuthMode::Disabled)
        ));
        assert!(matches!(
            resolve_auth(Some("secret".to_string()), false),
            Ok(AuthMode::Bearer(_))
        ));
    }

    #[test]
    fn test_auth_debug_redacts_secret() {
        let mode = AuthMode::Bearer("super-secret".to_string());
        let debugged = format!("{mode:?}");
        assert!(!debugged.contains("super-secret"));
        assert!(debugged.contains("***"));
    }

    #[test]
    fn test_settings_parse_overrides_defaults() {
        let settings: ServerConfig = toml::from_str(
            r#"
            timeout_secs = 5
            max_retries = 0
            max_field_chars = 500
            fetch_page_size = 50
            "#,
        )
        .unwrap();

        assert_eq!(settings.timeout_secs, 5);
        assert_eq!(settings.max_retries, 0);
        assert_eq!(settings.max_field_chars, 500);
        assert_eq!(settings.fetch_page_size, 50);
        assert_eq!(settings.base_url, "https://readwise.io");
    }

    #[test]
    fn test_missing_settings_file_falls_back_to_defaults() {
        let settings = ServerConfig::load(Path::new("/nonexistent/readwise-mcp.toml")).unwrap();
        assert_eq!(settings.fetch_page_size, 1000);
        assert_eq!(settings.max_field_chars, ShapeConfig::default().max_field_chars);
    }
}
