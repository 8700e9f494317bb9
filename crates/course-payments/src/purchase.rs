//! Purchase Recording
//!
//! The boundary where reconciled payments become purchases. Implementations
//! must treat the Square payment ID as unique: webhooks are delivered at
//! least once and the reconciler does not deduplicate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::tier::Tier;

/// Request to record a completed payment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub tier: Tier,
    pub square_purchase_id: String,
    pub user_id: String,
}

/// A recorded purchase
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub tier: Tier,
    pub square_purchase_id: String,
    pub user_id: String,
    pub recorded_at: DateTime<Utc>,
}

impl Purchase {
    pub fn new(request: PurchaseRequest) -> Self {
        Self {
            tier: request.tier,
            square_purchase_id: request.square_purchase_id,
            user_id: request.user_id,
            recorded_at: Utc::now(),
        }
    }
}

/// What happened to a record request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    Inserted,

    /// The payment ID was already recorded; nothing changed
    Duplicate,
}

/// Purchase storage
#[async_trait]
pub trait PurchaseRecorder: Send + Sync {
    /// Record a purchase, ignoring repeats of the same payment ID
    async fn add_purchase(&self, request: PurchaseRequest) -> Result<RecordOutcome>;

    /// Purchases recorded for a user, oldest first
    async fn purchases_for_user(&self, user_id: &str) -> Result<Vec<Purchase>>;
}

#[derive(Default)]
struct Tables {
    by_payment: HashMap<String, Purchase>,
    by_user: HashMap<String, Vec<String>>,
}

/// In-memory purchase store (for development)
#[derive(Default)]
pub struct MemoryPurchaseStore {
    tables: RwLock<Tables>,
}

impl MemoryPurchaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.by_payment.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PurchaseRecorder for MemoryPurchaseStore {
    async fn add_purchase(&self, request: PurchaseRequest) -> Result<RecordOutcome> {
        let mut tables = self.tables.write().await;

        if tables.by_payment.contains_key(&request.square_purchase_id) {
            return Ok(RecordOutcome::Duplicate);
        }

        let purchase = Purchase::new(request);
        tables
            .by_user
            .entry(purchase.user_id.clone())
            .or_default()
            .push(purchase.square_purchase_id.clone());
        tables
            .by_payment
            .insert(purchase.square_purchase_id.clone(), purchase);

        Ok(RecordOutcome::Inserted)
    }

    async fn purchases_for_user(&self, user_id: &str) -> Result<Vec<Purchase>> {
        let tables = self.tables.read().await;

        Ok(tables
            .by_user
            .get(user_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| tables.by_payment.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }
}
