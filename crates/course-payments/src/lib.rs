//! # course-payments
//!
//! Square checkout and payment reconciliation for the Quantum Course
//! storefront.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────┐  create_checkout  ┌──────────────┐   redirect   ┌──────────────┐
//! │    UI    │──────────────────▶│ CheckoutSvc  │─────────────▶│ Square Hosted│
//! └──────────┘                   └──────────────┘              │   Checkout   │
//!                                                              └──────┬───────┘
//!                                                  payment.updated    │
//! ┌──────────────────┐  add_purchase  ┌────────────────┐   webhook    │
//! │ PurchaseRecorder │◀───────────────│ WebhookHandler │◀─────────────┘
//! └──────────────────┘                └────────────────┘
//! ```
//!
//! The user ID travels to Square as order metadata at checkout time and
//! comes back by re-fetching the order when the payment completes. Nothing
//! is stored between the two steps.
//!
//! Webhooks are at-least-once. `WebhookHandler` records every completed
//! delivery it sees; the `PurchaseRecorder` deduplicates on the Square
//! payment ID.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use course_payments::{CheckoutRequest, CheckoutService, SquareClient, SquareConfig};
//!
//! let config = SquareConfig::from_env();
//! let square = Arc::new(SquareClient::new(config.clone())?);
//! let checkout = CheckoutService::new(square, config);
//!
//! let url = checkout.create_checkout(CheckoutRequest {
//!     tier: "Pro".into(),
//!     redirect_url: "https://example.com/welcome".into(),
//!     user_id: "user_123".into(),
//! }).await?;
//! ```

mod checkout;
mod config;
mod error;
pub mod event;
pub mod gateway;
mod purchase;
pub mod signature;
mod tier;
mod webhook;

pub use checkout::{CheckoutRequest, CheckoutService};
pub use config::{SquareConfig, SquareEnvironment};
pub use error::{PaymentError, Result};
pub use gateway::{MockGateway, Order, PaymentGateway, SquareClient};
pub use purchase::{MemoryPurchaseStore, Purchase, PurchaseRecorder, PurchaseRequest, RecordOutcome};
pub use signature::SIGNATURE_HEADER;
pub use tier::Tier;
pub use webhook::{SkipReason, WebhookHandler, WebhookOutcome};
