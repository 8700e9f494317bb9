//! HTTP Handlers

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use course_payments::{
    CheckoutRequest, PaymentError, Purchase, PurchaseRecorder, Tier, WebhookOutcome,
    SIGNATURE_HEADER,
};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub checkout_configured: bool,
    pub webhook_configured: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    /// `null` when Square returned no URL to redirect to
    pub checkout_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TierInfo {
    pub name: String,
    pub label: String,
    pub description: String,

    /// Minor currency units
    pub price: i64,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(err: &PaymentError) -> ApiError {
    let status = match err {
        PaymentError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
        PaymentError::InvalidArgument(_) | PaymentError::WebhookParse(_) => StatusCode::BAD_REQUEST,
        PaymentError::VerificationFailure(_) => StatusCode::UNAUTHORIZED,
        PaymentError::Provider(_) => StatusCode::BAD_GATEWAY,
        PaymentError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            error: err.user_message().into(),
            code: err.code().into(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        checkout_configured: state.config.checkout_configured(),
        webhook_configured: state.config.webhook_configured(),
    })
}

/// Tiers on sale
pub async fn list_tiers() -> Json<Vec<TierInfo>> {
    Json(
        Tier::ALL
            .iter()
            .map(|tier| TierInfo {
                name: tier.as_str().into(),
                label: tier.line_item_name(),
                description: tier.description().into(),
                price: tier.price(),
            })
            .collect(),
    )
}

/// Create Square checkout
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let checkout_url = state.checkout.create_checkout(payload).await.map_err(|e| {
        tracing::error!("Checkout error: {}", e);
        api_error(&e)
    })?;

    Ok(Json(CheckoutResponse { checkout_url }))
}

/// Square webhook receiver
///
/// Any error status makes Square retry the delivery.
pub async fn square_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    match state.webhooks.handle(&body, signature).await {
        Ok(WebhookOutcome::Reconciled(purchase)) => {
            tracing::debug!(square_purchase_id = %purchase.square_purchase_id, "Webhook reconciled");
            Ok(StatusCode::OK)
        }
        Ok(WebhookOutcome::Ignored(_)) => Ok(StatusCode::OK),
        Err(e) => {
            if matches!(e, PaymentError::VerificationFailure(_)) {
                tracing::warn!("Webhook rejected: {}", e);
            } else if e.is_retryable() {
                tracing::warn!(code = e.code(), "Webhook failed, Square will retry: {}", e);
            } else {
                tracing::error!(code = e.code(), "Webhook processing error: {}", e);
            }
            Err(api_error(&e))
        }
    }
}

/// Purchases recorded for a user
pub async fn user_purchases(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Purchase>>, ApiError> {
    let purchases = state
        .purchases
        .purchases_for_user(&user_id)
        .await
        .map_err(|e| api_error(&e))?;

    Ok(Json(purchases))
}
