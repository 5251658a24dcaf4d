//! Cuadra API Server
//!
//! Main entry point for the cash register reconciliation service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cuadra_api::{AppState, create_router};
use cuadra_core::register::{RegisterService, RegisterSettings};
use cuadra_db::{RegisterRepository, SalesFeedRepository, connect_with_pool};
use cuadra_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cuadra=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    let settings = RegisterSettings::from_config(&config.register)?;

    let db = connect_with_pool(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!("Connected to database");

    info!(
        tolerance = %settings.tolerance,
        currency = %settings.currency,
        max_close_attempts = settings.max_close_attempts,
        "Register settings loaded"
    );

    let service = RegisterService::new(
        Arc::new(RegisterRepository::new(db.clone())),
        Arc::new(SalesFeedRepository::new(db)),
        settings,
    );
    let app = create_router(AppState::new(service));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
