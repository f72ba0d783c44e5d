use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use scout_client::{HttpListingSource, ReqwestVerifier};
use scout_core::{PipelineConfig, SearchService};
use scout_db::{Database, DatabaseConfig};
use scout_server::routes;
use scout_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("scout=info".parse()?))
        .with_target(false)
        .init();

    let api_key =
        std::env::var("SCOUT_SERVER_API_KEY").context("SCOUT_SERVER_API_KEY must be set")?;
    let port = std::env::var("SCOUT_SERVER_PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{port}");

    let db = Database::connect(&DatabaseConfig::from_env()?).await?;
    db.migrate().await?;

    let config = PipelineConfig::from_env()?;
    let source = HttpListingSource::from_env()?;
    let verifier = ReqwestVerifier::with_timeout(config.verify_timeout)?;
    let search = SearchService::new(source, db.store(), verifier, &config);

    let state = Arc::new(AppState {
        db,
        search,
        api_key,
    });

    let app = routes::router(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let live = state.search.manager().live_sessions();
    if live > 0 {
        tracing::warn!(live, "Shutting down with sessions still ingesting");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
