//! Application State

use std::sync::Arc;

use course_payments::{CheckoutService, MemoryPurchaseStore, PaymentGateway, SquareConfig, WebhookHandler};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Square configuration, re-checked by every operation
    pub config: Arc<SquareConfig>,

    pub checkout: Arc<CheckoutService>,

    pub webhooks: Arc<WebhookHandler<MemoryPurchaseStore>>,

    /// Purchase store backing the webhook reconciler
    pub purchases: Arc<MemoryPurchaseStore>,
}

impl AppState {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        purchases: Arc<MemoryPurchaseStore>,
        config: SquareConfig,
    ) -> Self {
        Self {
            checkout: Arc::new(CheckoutService::new(gateway.clone(), config.clone())),
            webhooks: Arc::new(WebhookHandler::new(gateway, purchases.clone(), config.clone())),
            purchases,
            config: Arc::new(config),
        }
    }
}
