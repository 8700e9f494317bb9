//! Checkout Initiation
//!
//! Validates the tier, prices it in the location's currency and opens a
//! Square hosted checkout for the user to be redirected to.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::SquareConfig;
use crate::error::Result;
use crate::gateway::{CheckoutSessionRequest, PaymentGateway};
use crate::tier::Tier;

/// Request to create a checkout
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Tier name, validated against the known tiers
    pub tier: String,

    /// Where Square sends the buyer after payment
    pub redirect_url: String,

    /// Opaque user ID, returned to us through order metadata
    pub user_id: String,
}

/// Creates checkouts against a payment gateway
pub struct CheckoutService {
    gateway: Arc<dyn PaymentGateway>,
    config: SquareConfig,
}

impl CheckoutService {
    pub fn new(gateway: Arc<dyn PaymentGateway>, config: SquareConfig) -> Self {
        Self { gateway, config }
    }

    /// Create a checkout and return the URL to redirect to.
    ///
    /// `Ok(None)` means Square accepted the request but returned no URL;
    /// callers cannot redirect in that case.
    pub async fn create_checkout(&self, request: CheckoutRequest) -> Result<Option<String>> {
        let tier: Tier = request.tier.parse()?;
        let location_id = self.config.require_location_id()?;

        // Not cached: the location's currency can change between calls
        let currency = self.gateway.location_currency(location_id).await?;

        let session = CheckoutSessionRequest {
            location_id: location_id.to_string(),
            tier,
            price: tier.price(),
            currency,
            redirect_url: request.redirect_url,
            user_id: request.user_id,
            idempotency_key: Uuid::new_v4().to_string(),
            order_idempotency_key: Uuid::new_v4().to_string(),
        };

        tracing::info!(
            gateway = self.gateway.name(),
            tier = %tier,
            user_id = %session.user_id,
            price = session.price,
            currency = %session.currency,
            idempotency_key = %session.idempotency_key,
            "Creating checkout"
        );

        let link = self.gateway.create_checkout(&session).await?;

        if link.checkout_url.is_none() {
            tracing::warn!(
                checkout_id = ?link.checkout_id,
                user_id = %session.user_id,
                "Checkout created without a checkout URL"
            );
        }

        Ok(link.checkout_url)
    }
}
