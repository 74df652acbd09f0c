//! Best-effort inventory reconciliation.
//!
//! After an order converges, [`InventoryReconciler`] fetches the full stock
//! listing and checks that every requested product is known to the inventory
//! service. The result is informational: a missing product or an unreachable
//! service is reported, never raised.
//!
//! | Outcome       | When                                               |
//! |---------------|----------------------------------------------------|
//! | `Verified`    | every requested product is present in the listing  |
//! | `Degraded`    | the listing was read but some products are missing |
//! | `Unreachable` | transport failure, non-2xx status or bad JSON      |

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use orderprobe_core::config::InventoryServiceConfig;
use orderprobe_core::types::{InventoryRecord, InventorySnapshot, LineItem};

use crate::error::{InventoryError, truncate_body};

/// Verdict of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    Verified,
    Degraded(String),
    Unreachable(String),
}

/// What the listing said about one requested product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ItemFinding {
    Found {
        product_id: Uuid,
        product_name: String,
        quantity: i64,
        reserved_quantity: i64,
    },
    Missing {
        product_id: Uuid,
        product_name: String,
    },
}

/// Outcome plus per-item findings. Findings are empty when unreachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub outcome: ReconcileOutcome,
    pub findings: Vec<ItemFinding>,
}

impl Reconciliation {
    pub fn is_verified(&self) -> bool {
        self.outcome == ReconcileOutcome::Verified
    }

    fn unreachable(reason: impl Into<String>) -> Self {
        Self {
            outcome: ReconcileOutcome::Unreachable(reason.into()),
            findings: Vec::new(),
        }
    }
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verified => write!(f, "verified"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
            Self::Unreachable(reason) => write!(f, "unreachable: {reason}"),
        }
    }
}

/// HTTP client for the inventory listing endpoint.
#[derive(Debug, Clone)]
pub struct InventoryReconciler {
    client: Client,
    url: String,
}

impl InventoryReconciler {
    pub fn new(config: &InventoryServiceConfig) -> Result<Self, InventoryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| InventoryError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Read the full stock listing.
    pub async fn fetch_snapshot(&self) -> Result<InventorySnapshot, InventoryError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| InventoryError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| InventoryError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(InventoryError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let records: Vec<InventoryRecord> =
            serde_json::from_str(&body).map_err(|e| InventoryError::Decode(e.to_string()))?;
        debug!(url = %self.url, records = records.len(), "inventory listing fetched");
        Ok(InventorySnapshot::from_records(records))
    }

    /// Check each requested item against a fresh snapshot.
    pub async fn reconcile(&self, items: &[LineItem]) -> Reconciliation {
        match self.fetch_snapshot().await {
            Ok(snapshot) => reconcile_against(&snapshot, items),
            Err(e) => {
                warn!(url = %self.url, error = %e, "inventory service unreachable");
                Reconciliation::unreachable(e.to_string())
            }
        }
    }
}

/// Pure part of [`InventoryReconciler::reconcile`].
pub fn reconcile_against(snapshot: &InventorySnapshot, items: &[LineItem]) -> Reconciliation {
    let mut findings = Vec::with_capacity(items.len());
    let mut missing = Vec::new();

    for item in items {
        match snapshot.get(&item.product_id) {
            Some(record) => {
                info!(
                    product_id = %item.product_id,
                    product_name = %item.product_name,
                    quantity = record.quantity,
                    reserved_quantity = record.reserved_quantity,
                    "inventory record found"
                );
                findings.push(ItemFinding::Found {
                    product_id: item.product_id,
                    product_name: item.product_name.clone(),
                    quantity: record.quantity,
                    reserved_quantity: record.reserved_quantity,
                });
            }
            None => {
                warn!(
                    product_id = %item.product_id,
                    product_name = %item.product_name,
                    "product not found in inventory"
                );
                missing.push(item.product_id.to_string());
                findings.push(ItemFinding::Missing {
                    product_id: item.product_id,
                    product_name: item.product_name.clone(),
                });
            }
        }
    }

    let outcome = if missing.is_empty() {
        ReconcileOutcome::Verified
    } else {
        ReconcileOutcome::Degraded(format!(
            "{} of {} product(s) missing from inventory: {}",
            missing.len(),
            items.len(),
            missing.join(", ")
        ))
    };

    Reconciliation { outcome, findings }
}
