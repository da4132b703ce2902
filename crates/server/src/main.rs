use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod api;
mod config;
mod middleware;

use config::{resolve_auth, AppState, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "readwise-mcp")]
#[command(about = "HTTP MCP gateway for the Readwise and Readwise Reader APIs", long_about = None)]
struct Args {
    /// Path to the settings file
    #[arg(short, long, default_value = "readwise-mcp.toml")]
    settings: PathBuf,

    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8000")]
    port: u16,

    /// Readwise access token used for outbound calls
    #[arg(long, env = "READWISE_TOKEN", hide_env_values = true)]
    readwise_token: String,

    /// Secret inbound callers must present as a bearer token
    #[arg(long, env = "MCP_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Serve without inbound authentication
    #[arg(long, env = "MCP_ALLOW_AUTHLESS", default_value_t = false)]
    allow_authless: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "readwise_mcp=info,readwise_mcp_server=info,tower_http=info".into()
            }),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    tracing::info!("Starting Readwise MCP gateway");

    let settings = ServerConfig::load(&args.settings)?;
    let auth = resolve_auth(args.api_key, args.allow_authless)?;
    let client = settings.build_client(args.readwise_token)?;
    let state = AppState::new(client, settings.shape(), auth);

    let addr = format!("{}:{}", args.host, args.port);
    tracing::info!("Starting API server on {}", addr);

    api::serve(&addr, state).await?;

    Ok(())
}
