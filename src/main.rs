use prada_api_rust::app::{bootstrap, serve};
use prada_api_rust::config::AppConfig;
use prada_api_rust::hooks::HookRegistry;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, PRADA_SCHEMA, etc.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env();

    // RUST_LOG wins; otherwise query debug logging shows the derived clauses
    let default_filter = if config.query.debug_logging {
        "info,prada_api_rust::api=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    tracing::info!("Starting PRADA API in {:?} mode", config.environment);

    let state = bootstrap(config, HookRegistry::new()).await?;
    serve(state).await
}
