//! Domain types shared by every orderprobe crate.
//!
//! The order service owns the lifecycle of an order; orderprobe only submits
//! requests and observes the resulting state. These types describe the wire
//! shapes of both services and the fixtures the runner consumes.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Opaque order identifier issued by the order service.
///
/// Once returned by a submission it is the only key used to observe the order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Order status as persisted by the order service.
///
/// The store holds an integer code (`0=Pending, 1=Processing, 2=Completed,
/// 3=Failed`). Codes outside that range decode to [`OrderStatus::Unknown`],
/// which never satisfies any expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    /// Unrecognised status code read from the store.
    Unknown(i32),
}

impl OrderStatus {
    /// Decode a status code read from the `Orders` table.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Pending,
            1 => Self::Processing,
            2 => Self::Completed,
            3 => Self::Failed,
            other => Self::Unknown(other),
        }
    }

    /// `Completed` and `Failed` are terminal: no further transition is expected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether an observed status satisfies `expected`.
    ///
    /// `Unknown` never matches, not even another `Unknown` with the same code.
    pub fn matches(&self, expected: OrderStatus) -> bool {
        match (self, expected) {
            (Self::Unknown(_), _) | (_, Self::Unknown(_)) => false,
            (observed, expected) => *observed == expected,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Processing => write!(f, "Processing"),
            Self::Completed => write!(f, "Completed"),
            Self::Failed => write!(f, "Failed"),
            Self::Unknown(code) => write!(f, "Unknown({code})"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!(
                "unknown order status '{s}' (expected: Pending, Processing, Completed, Failed)"
            )),
        }
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A single requested product in an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: f64,
}

/// Order creation request body.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub customer_name: String,
    pub shipping_address: String,
    pub total_amount: f64,
    pub card_number: String,
    pub items: Vec<LineItem>,
}

impl OrderRequest {
    /// Card number with every digit but the last four masked.
    pub fn masked_card_number(&self) -> String {
        let digits: Vec<char> = self
            .card_number
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        let keep = digits.len().saturating_sub(4);
        digits
            .iter()
            .enumerate()
            .map(|(i, c)| if i < keep { '*' } else { *c })
            .collect()
    }
}

impl fmt::Debug for OrderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderRequest")
            .field("customer_name", &self.customer_name)
            .field("shipping_address", &self.shipping_address)
            .field("total_amount", &self.total_amount)
            .field("card_number", &self.masked_card_number())
            .field("items", &self.items)
            .finish()
    }
}

/// One row of the inventory service's stock listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub product_id: Uuid,
    pub quantity: i64,
    pub reserved_quantity: i64,
}

/// Stock levels keyed by product, fetched fresh for every reconciliation.
#[derive(Debug, Clone, Default)]
pub struct InventorySnapshot {
    records: HashMap<Uuid, InventoryRecord>,
}

impl InventorySnapshot {
    /// Build a snapshot from the service listing. A later row for the same
    /// product replaces an earlier one.
    pub fn from_records(records: impl IntoIterator<Item = InventoryRecord>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.product_id, r)).collect(),
        }
    }

    pub fn get(&self, product_id: &Uuid) -> Option<&InventoryRecord> {
        self.records.get(product_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A named fixture pairing a submission payload with the status the order
/// must converge to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub expected_status: OrderStatus,
    pub payload: OrderRequest,
}

/// The two scenarios exercised when the configuration declares none.
///
/// The amounts sit on either side of the order service's acceptance
/// threshold; the threshold itself is the service's business and is not
/// modelled here.
pub fn builtin_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "Successful Order".to_owned(),
            expected_status: OrderStatus::Completed,
            payload: OrderRequest {
                customer_name: "Test User Success".to_owned(),
                shipping_address: "123 Main St".to_owned(),
                total_amount: 500.0,
                card_number: "1234-5678-9012-3456".to_owned(),
                items: vec![LineItem {
                    product_id: Uuid::from_u128(0x11111111_1111_1111_1111_111111111111),
                    product_name: "Item A".to_owned(),
                    quantity: 1,
                    unit_price: 500.0,
                }],
            },
        },
        Scenario {
            name: "Failed Order".to_owned(),
            expected_status: OrderStatus::Failed,
            payload: OrderRequest {
                customer_name: "Test User Fail".to_owned(),
                shipping_address: "456 Elm St".to_owned(),
                total_amount: 1500.0,
                card_number: "9876-5432-1098-7654".to_owned(),
                items: vec![LineItem {
                    product_id: Uuid::from_u128(0x22222222_2222_2222_2222_222222222222),
                    product_name: "Item B".to_owned(),
                    quantity: 1,
                    unit_price: 1500.0,
                }],
            },
        },
    ]
}
