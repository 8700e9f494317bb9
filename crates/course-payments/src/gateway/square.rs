//! Square REST client
//!
//! Uses the Locations, Checkout and Orders APIs directly over `reqwest`.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;

use super::{CheckoutLink, CheckoutSessionRequest, Order, PaymentGateway};
use crate::config::SquareConfig;
use crate::error::{PaymentError, Result};

/// Square API version sent with every request
pub const SQUARE_VERSION: &str = "2024-01-18";

/// Square client, constructed once from configuration and shared
pub struct SquareClient {
    http: Client,
    config: SquareConfig,
}

impl SquareClient {
    pub fn new(config: SquareConfig) -> Result<Self> {
        if config.timeout.is_zero() {
            return Err(PaymentError::Config("Square request timeout must be positive".into()));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::Config(format!("HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    fn access_token(&self) -> Result<&str> {
        self.config
            .access_token
            .as_deref()
            .ok_or_else(|| PaymentError::Config("SQUARE_ACCESS_TOKEN not set".into()))
    }

    fn request(&self, method: reqwest::Method, path: &str) -> Result<RequestBuilder> {
        let url = format!("{}{}", self.config.api_base_url().trim_end_matches('/'), path);
        Ok(self
            .http
            .request(method, url)
            .bearer_auth(self.access_token()?)
            .header("Square-Version", SQUARE_VERSION))
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(provider_error(status, &body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| PaymentError::Provider(format!("Invalid Square response: {e}")))
    }
}

#[async_trait]
impl PaymentGateway for SquareClient {
    async fn location_currency(&self, location_id: &str) -> Result<String> {
        let request = self.request(reqwest::Method::GET, &format!("/v2/locations/{location_id}"))?;
        let response: LocationResponse = Self::send(request).await?;

        response
            .location
            .and_then(|l| l.currency)
            .ok_or_else(|| PaymentError::Provider(format!("Location {location_id} has no currency")))
    }

    async fn create_checkout(&self, request: &CheckoutSessionRequest) -> Result<CheckoutLink> {
        let body = CreateCheckoutBody::from_request(request);
        let path = format!("/v2/locations/{}/checkouts", request.location_id);

        tracing::debug!(
            location_id = %request.location_id,
            idempotency_key = %request.idempotency_key,
            "Creating Square checkout"
        );

        let response: CreateCheckoutResponse =
            Self::send(self.request(reqwest::Method::POST, &path)?.json(&body)).await?;

        Ok(response.checkout.map_or_else(CheckoutLink::default, |c| CheckoutLink {
            checkout_id: c.id,
            checkout_url: c.checkout_page_url,
        }))
    }

    async fn retrieve_order(&self, order_id: &str) -> Result<Order> {
        let request = self.request(reqwest::Method::GET, &format!("/v2/orders/{order_id}"))?;
        let response: RetrieveOrderResponse = Self::send(request).await?;

        response
            .order
            .ok_or_else(|| PaymentError::Provider(format!("Order {order_id} not found")))
    }

    fn name(&self) -> &str {
        "Square"
    }
}

fn provider_error(status: StatusCode, body: &str) -> PaymentError {
    let detail = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|r| r.errors.into_iter().next())
        .map(|e| match e.detail {
            Some(detail) => format!("{}: {detail}", e.code),
            None => e.code,
        });

    match detail {
        Some(detail) => PaymentError::Provider(format!("{status} {detail}")),
        None => PaymentError::Provider(status.to_string()),
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct CreateCheckoutBody<'a> {
    idempotency_key: &'a str,
    order: CreateOrderBody<'a>,
    redirect_url: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    idempotency_key: &'a str,
    order: OrderBody<'a>,
}

#[derive(Debug, Serialize)]
struct OrderBody<'a> {
    location_id: &'a str,
    line_items: Vec<LineItemBody<'a>>,
    metadata: HashMap<&'static str, &'a str>,
}

#[derive(Debug, Serialize)]
struct LineItemBody<'a> {
    name: String,
    quantity: &'static str,
    base_price_money: Money<'a>,
}

#[derive(Debug, Serialize)]
struct Money<'a> {
    amount: i64,
    currency: &'a str,
}

impl<'a> CreateCheckoutBody<'a> {
    fn from_request(request: &'a CheckoutSessionRequest) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert("userId", request.user_id.as_str());
        metadata.insert("tier", request.tier.as_str());

        Self {
            idempotency_key: &request.idempotency_key,
            order: CreateOrderBody {
                idempotency_key: &request.order_idempotency_key,
                order: OrderBody {
                    location_id: &request.location_id,
                    line_items: vec![LineItemBody {
                        name: request.tier.line_item_name(),
                        quantity: "1",
                        base_price_money: Money {
                            amount: request.price,
                            currency: &request.currency,
                        },
                    }],
                    metadata,
                },
            },
            redirect_url: &request.redirect_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LocationResponse {
    location: Option<Location>,
}

#[derive(Debug, Deserialize)]
struct Location {
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateCheckoutResponse {
    checkout: Option<Checkout>,
}

#[derive(Debug, Deserialize)]
struct Checkout {
    id: Option<String>,
    checkout_page_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RetrieveOrderResponse {
    order: Option<Order>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<SquareApiError>,
}

#[derive(Debug, Deserialize)]
struct SquareApiError {
    code: String,
    detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::Tier;

    fn request() -> CheckoutSessionRequest {
        CheckoutSessionRequest {
            location_id: "LOC1".into(),
            tier: Tier::Elite,
            price: Tier::Elite.price(),
            currency: "USD".into(),
            redirect_url: "https://example.com/thanks".into(),
            user_id: "u1".into(),
            idempotency_key: "key-a".into(),
            order_idempotency_key: "key-b".into(),
        }
    }

    #[test]
    fn test_checkout_body_shape() {
        let request = request();
        let body = serde_json::to_value(CreateCheckoutBody::from_request(&request)).unwrap();

        assert_eq!(body["idempotency_key"], "key-a");
        assert_eq!(body["redirect_url"], "https://example.com/thanks");
        assert_eq!(body["order"]["idempotency_key"], "key-b");

        let order = &body["order"]["order"];
        assert_eq!(order["location_id"], "LOC1");
        assert_eq!(order["metadata"]["userId"], "u1");
        assert_eq!(order["metadata"]["tier"], "Elite");

        let items = order["line_items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "Quantum Course - Elite");
        assert_eq!(items[0]["quantity"], "1");
        assert_eq!(items[0]["base_price_money"]["amount"], 149_700);
        assert_eq!(items[0]["base_price_money"]["currency"], "USD");
    }

    #[test]
    fn test_provider_error_uses_square_detail() {
        let body = r#"{"errors":[{"category":"INVALID_REQUEST_ERROR","code":"NOT_FOUND","detail":"Order not found"}]}"#;
        let err = provider_error(StatusCode::NOT_FOUND, body);
        assert_eq!(err.to_string(), "Square error: 404 Not Found NOT_FOUND: Order not found");

        let err = provider_error(StatusCode::BAD_GATEWAY, "<html>");
        assert!(matches!(err, PaymentError::Provider(msg) if msg.starts_with("502")));
    }

    #[tokio::test]
    async fn test_missing_token_fails_before_network() {
        let client = SquareClient::new(SquareConfig::default()).unwrap();
        let result = client.retrieve_order("ord_1").await;
        assert!(matches!(result, Err(PaymentError::Config(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = SquareConfig {
            timeout: std::time::Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(SquareClient::new(config), Err(PaymentError::Config(_))));
    }

    #[test]
    fn test_checkout_response_without_url() {
        let response: CreateCheckoutResponse =
            serde_json::from_str(r#"{"checkout":{"id":"chk_1"}}"#).unwrap();
        let checkout = response.checkout.unwrap();
        assert_eq!(checkout.id.as_deref(), Some("chk_1"));
        assert!(checkout.checkout_page_url.is_none());
    }
}
