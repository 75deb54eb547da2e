use std::sync::Arc;

use anyhow::Context;

use gerenciamento_api::app::{app, AppState};
use gerenciamento_api::config::config;
use gerenciamento_api::is_development;
use gerenciamento_api::services::ProjectService;
use gerenciamento_api::store::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up PORT, CORS_ORIGINS, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config();
    tracing::info!("starting gerenciamento-api in {:?} mode", config.environment);
    if is_development!() {
        tracing::debug!(?config, "resolved configuration");
    }

    let store = Arc::new(MemoryStore::new());
    let service = Arc::new(ProjectService::new(store));
    let app = app(AppState::new(service));

    let bind_addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    println!("🚀 Gerenciamento API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
