//! Router

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{create_checkout, health_check, list_tiers, square_webhook, user_purchases};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/tiers", get(list_tiers))
        .route("/api/checkout", post(create_checkout))
        .route("/api/users/{user_id}/purchases", get(user_purchases))
        .route("/webhook/square", post(square_webhook))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
