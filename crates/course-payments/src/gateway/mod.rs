//! Payment Provider Gateway
//!
//! The seam between checkout/reconciliation and Square. `SquareClient`
//! talks to the real API; `MockGateway` scripts responses for tests.

mod mock;
mod square;

pub use mock::{GatewayCall, MockGateway};
pub use square::SquareClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Result;
use crate::tier::Tier;

/// Everything needed to open a hosted checkout for one tier
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub location_id: String,
    pub tier: Tier,

    /// Minor currency units
    pub price: i64,
    pub currency: String,
    pub redirect_url: String,

    /// Carried as order metadata back to the webhook
    pub user_id: String,

    /// Idempotency key for the checkout itself
    pub idempotency_key: String,

    /// Idempotency key for the nested order
    pub order_idempotency_key: String,
}

/// Result of creating a checkout
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckoutLink {
    pub checkout_id: Option<String>,
    pub checkout_url: Option<String>,
}

/// Order as read back from Square
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub line_items: Vec<OrderLineItem>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    #[serde(default)]
    pub name: Option<String>,
}

impl Order {
    pub fn first_line_item_name(&self) -> Option<&str> {
        self.line_items.first().and_then(|item| item.name.as_deref())
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Payment provider operations used by checkout and reconciliation
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Currency code of a sale location
    async fn location_currency(&self, location_id: &str) -> Result<String>;

    /// Create a hosted checkout
    async fn create_checkout(&self, request: &CheckoutSessionRequest) -> Result<CheckoutLink>;

    /// Retrieve an order by ID
    async fn retrieve_order(&self, order_id: &str) -> Result<Order>;

    /// Provider name
    fn name(&self) -> &str;
}
