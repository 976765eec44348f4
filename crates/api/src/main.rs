use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use campus_events_api::app::{build_router, AppState};
use campus_events_api::config::Config;
use campus_events_api::middleware::{init_metrics, logging::init_logging, rate_limit::PRUNE_INTERVAL};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    init_logging(&config.logging);
    init_metrics()?;

    info!("Starting Campus Events API v{}", env!("CARGO_PKG_VERSION"));

    let db_config: persistence::db::DatabaseConfig = (&config.database).into();
    let store = persistence::db::connect_store(&db_config)
        .await
        .context("connecting to the database")?;

    let addr = config.socket_addr()?;
    let state = AppState::new(config, Arc::new(store))?;
    if let Some(limiter) = &state.rate_limiter {
        limiter.clone().spawn_pruner(PRUNE_INTERVAL);
    }
    let app = build_router(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
