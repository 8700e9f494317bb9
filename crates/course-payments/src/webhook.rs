//! Square Webhook Handling
//!
//! Verifies webhook signatures and reconciles completed payments into
//! purchases.
//!
//! ```text
//! Received ──verify──▶ Verified ──decode──▶ Parsed ──┬──▶ Ignored
//!    │                                               └──▶ Reconciled
//!    └──▶ Rejected
//! ```

use std::fmt;
use std::sync::Arc;

use crate::config::SquareConfig;
use crate::error::{PaymentError, Result};
use crate::event::{EventDecoder, JsonEventDecoder, PaymentStatus, ProviderEvent};
use crate::gateway::{Order, PaymentGateway};
use crate::purchase::{PurchaseRecorder, PurchaseRequest, RecordOutcome};
use crate::signature::{verify_signature, verify_signature_with_url};
use crate::tier::Tier;

/// Why a verified event did not produce a purchase
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Event type we do not act on
    EventType(String),

    /// Payment exists but has not completed
    NotCompleted(PaymentStatus),

    /// Known event type with an unexpected payload
    MalformedEvent(String),

    MissingOrderId,
    MissingPaymentId,
    MissingUserId,

    /// Order does not name a known tier
    UnknownTier(Option<String>),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EventType(t) => write!(f, "ignored event type {t:?}"),
            Self::NotCompleted(status) => write!(f, "payment status {:?}", status.as_str()),
            Self::MalformedEvent(reason) => write!(f, "malformed event: {reason}"),
            Self::MissingOrderId => f.write_str("payment has no order id"),
            Self::MissingPaymentId => f.write_str("payment has no id"),
            Self::MissingUserId => f.write_str("order metadata has no userId"),
            Self::UnknownTier(name) => write!(f, "order has no known tier ({name:?})"),
        }
    }
}

/// Result of handling one webhook delivery
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookOutcome {
    Ignored(SkipReason),
    Reconciled(PurchaseRequest),
}

/// Webhook handler
pub struct WebhookHandler<R: PurchaseRecorder> {
    gateway: Arc<dyn PaymentGateway>,
    recorder: Arc<R>,
    config: SquareConfig,
    decoder: Box<dyn EventDecoder>,
}

impl<R: PurchaseRecorder> WebhookHandler<R> {
    pub fn new(gateway: Arc<dyn PaymentGateway>, recorder: Arc<R>, config: SquareConfig) -> Self {
        Self {
            gateway,
            recorder,
            config,
            decoder: Box::new(JsonEventDecoder),
        }
    }

    /// Replace the event decoder
    #[must_use]
    pub fn with_decoder(mut self, decoder: Box<dyn EventDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Verify, decode and reconcile one delivery.
    ///
    /// Errors mean the delivery should be answered with a failure status so
    /// Square retries it. Skips are not errors.
    pub async fn handle(&self, raw_body: &str, signature: &str) -> Result<WebhookOutcome> {
        self.verify(raw_body, signature)?;

        let event = self.decoder.decode(raw_body)?;
        tracing::info!(
            event_type = %event.event_type(),
            event_id = event.event_id().unwrap_or_default(),
            "Processing Square webhook"
        );

        let outcome = self.reconcile(event).await?;
        if let WebhookOutcome::Ignored(reason) = &outcome {
            tracing::debug!(%reason, "Webhook ignored");
        }

        Ok(outcome)
    }

    fn verify(&self, raw_body: &str, signature: &str) -> Result<()> {
        let secret = self.config.require_signature_key()?;

        let valid = match self.config.webhook_notification_url.as_deref() {
            Some(url) => verify_signature_with_url(url, raw_body, signature, secret),
            None => verify_signature(raw_body, signature, secret),
        };

        if !valid {
            tracing::warn!("Square webhook signature did not verify");
            return Err(PaymentError::VerificationFailure(
                "Webhook signature verification failed".into(),
            ));
        }

        Ok(())
    }

    async fn reconcile(&self, event: ProviderEvent) -> Result<WebhookOutcome> {
        let payment = match event {
            ProviderEvent::PaymentUpdated { payment, .. } => payment,
            ProviderEvent::Malformed { reason, .. } => {
                return Ok(WebhookOutcome::Ignored(SkipReason::MalformedEvent(reason)));
            }
            ProviderEvent::Other { event_type } => {
                return Ok(WebhookOutcome::Ignored(SkipReason::EventType(event_type)));
            }
        };

        if payment.status != PaymentStatus::Completed {
            return Ok(WebhookOutcome::Ignored(SkipReason::NotCompleted(payment.status)));
        }

        let Some(order_id) = payment.order_id.as_deref().filter(|id| !id.is_empty()) else {
            return Ok(WebhookOutcome::Ignored(SkipReason::MissingOrderId));
        };

        // The event does not carry line items or metadata; the order is the source of truth
        let order = self.gateway.retrieve_order(order_id).await?;

        let tier = match order_tier(&order) {
            Ok(tier) => tier,
            Err(name) => return Ok(WebhookOutcome::Ignored(SkipReason::UnknownTier(name))),
        };
        let Some(square_purchase_id) = payment.id.filter(|id| !id.is_empty()) else {
            return Ok(WebhookOutcome::Ignored(SkipReason::MissingPaymentId));
        };
        let Some(user_id) = order.metadata_value("userId") else {
            return Ok(WebhookOutcome::Ignored(SkipReason::MissingUserId));
        };

        let request = PurchaseRequest {
            tier,
            square_purchase_id,
            user_id: user_id.to_string(),
        };

        let recorded = self.recorder.add_purchase(request.clone()).await?;

        tracing::info!(
            tier = %request.tier,
            square_purchase_id = %request.square_purchase_id,
            user_id = %request.user_id,
            duplicate = recorded == RecordOutcome::Duplicate,
            "Recorded purchase"
        );

        Ok(WebhookOutcome::Reconciled(request))
    }
}

/// Tier from order metadata when the key is present, otherwise from the
/// line-item name. The error carries the name that failed to match.
fn order_tier(order: &Order) -> std::result::Result<Tier, Option<String>> {
    if let Some(name) = order.metadata_value("tier") {
        return name.parse().map_err(|_| Some(name.to_string()));
    }

    let name = order.first_line_item_name();
    name.and_then(Tier::from_line_item_name)
        .ok_or_else(|| name.map(str::to_string))
}
