//! Mock Gateway
//!
//! Scripted responses and a call log, for tests and local demos.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::{CheckoutLink, CheckoutSessionRequest, Order, PaymentGateway};
use crate::error::{PaymentError, Result};

/// A call received by the mock
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GatewayCall {
    LocationCurrency(String),
    CreateCheckout(CheckoutSessionRequest),
    RetrieveOrder(String),
}

/// Mock gateway with scripted responses
pub struct MockGateway {
    currency: Option<String>,
    checkout_url: Option<String>,
    fail_checkout: bool,
    orders: HashMap<String, Order>,
    calls: Mutex<Vec<GatewayCall>>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    /// USD location, checkout returns a fixed URL, no orders
    pub fn new() -> Self {
        Self {
            currency: Some("USD".into()),
            checkout_url: Some("https://checkout.example.com/pay/mock".into()),
            fail_checkout: false,
            orders: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Set the location currency; `None` makes the lookup fail
    #[must_use]
    pub fn with_currency(mut self, currency: Option<&str>) -> Self {
        self.currency = currency.map(str::to_string);
        self
    }

    /// Set the checkout URL; `None` simulates a response without one
    #[must_use]
    pub fn with_checkout_url(mut self, url: Option<&str>) -> Self {
        self.checkout_url = url.map(str::to_string);
        self
    }

    /// Make checkout creation fail with a provider error
    #[must_use]
    pub fn failing_checkout(mut self) -> Self {
        self.fail_checkout = true;
        self
    }

    #[must_use]
    pub fn with_order(mut self, order_id: &str, order: Order) -> Self {
        self.orders.insert(order_id.to_string(), order);
        self
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record(&self, call: GatewayCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn location_currency(&self, location_id: &str) -> Result<String> {
        self.record(GatewayCall::LocationCurrency(location_id.to_string()));
        self.currency
            .clone()
            .ok_or_else(|| PaymentError::Provider(format!("Location {location_id} not found")))
    }

    async fn create_checkout(&self, request: &CheckoutSessionRequest) -> Result<CheckoutLink> {
        self.record(GatewayCall::CreateCheckout(request.clone()));
        if self.fail_checkout {
            return Err(PaymentError::Provider("400 Bad Request INVALID_REQUEST_ERROR".into()));
        }
        Ok(CheckoutLink {
            checkout_id: Some(format!("chk_{}", request.idempotency_key)),
            checkout_url: self.checkout_url.clone(),
        })
    }

    async fn retrieve_order(&self, order_id: &str) -> Result<Order> {
        self.record(GatewayCall::RetrieveOrder(order_id.to_string()));
        self.orders
            .get(order_id)
            .cloned()
            .ok_or_else(|| PaymentError::Provider(format!("Order {order_id} not found")))
    }

    fn name(&self) -> &str {
        "MockGateway"
    }
}
