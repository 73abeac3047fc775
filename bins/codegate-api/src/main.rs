mod handlers;
mod metrics;
mod routes;

use anyhow::Context;
use codegate_common::config::GatewayConfig;
use codegate_common::engine::{ExecutionClient, PistonClient};
use codegate_common::gateway::Gateway;
use codegate_common::languages::LanguageRegistry;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub struct AppState {
    pub gateway: Gateway<Arc<dyn ExecutionClient>>,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Codegate API booting...");

    let config = GatewayConfig::from_env().context("Invalid gateway configuration")?;

    let registry = match &config.languages_path {
        Some(path) => LanguageRegistry::load(path)
            .with_context(|| format!("Failed to load language table from {}", path.display()))?,
        None => LanguageRegistry::builtin(),
    };
    info!("Loaded languages: {:?}", registry.list_supported());

    let client = PistonClient::new(config.engine_url.clone())
        .context("Failed to build execution engine client")?;
    info!(
        engine = %client.endpoint(),
        timeout_secs = config.timeout.as_secs(),
        "Execution engine configured"
    );

    let client: Arc<dyn ExecutionClient> = Arc::new(client);
    let state = Arc::new(AppState {
        gateway: Gateway::new(Arc::new(registry), client, &config),
    });

    let app = routes::app(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!("HTTP server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
