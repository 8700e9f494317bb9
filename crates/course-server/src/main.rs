//! Quantum Course checkout server
//!
//! Axum server exposing checkout creation and the Square webhook receiver.

mod handlers;
mod routes;
mod state;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use course_payments::{MemoryPurchaseStore, SquareClient, SquareConfig};

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SquareConfig::from_env();
    let missing = config.missing_vars();

    if missing.is_empty() {
        tracing::info!(environment = ?config.environment, "✓ Square configured");
    } else {
        tracing::warn!("⚠ SQUARE environment variables not set. Square integration will not work.");
        tracing::warn!("  Missing: {}", missing.join(", "));
    }

    let square = Arc::new(SquareClient::new(config.clone())?);
    let purchases = Arc::new(MemoryPurchaseStore::new());
    let state = AppState::new(square, purchases, config);

    let app = routes::router(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("course-server running on http://{}", addr);
    tracing::info!("  GET  /health                       - Health check");
    tracing::info!("  GET  /api/tiers                    - List tiers");
    tracing::info!("  POST /api/checkout                 - Create Square checkout");
    tracing::info!("  GET  /api/users/{{id}}/purchases     - Purchases for a user");
    tracing::info!("  POST /webhook/square               - Square webhook");

    axum::serve(listener, app).await?;

    Ok(())
}
