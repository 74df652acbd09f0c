//! In-memory stand-ins for the order service, order store and inventory
//! service.
//!
//! `FakeOrderService` and `FakeOrderStore` share state: submitting an order
//! registers the status timeline the store will report for it, one entry per
//! read, the last entry repeating. This mimics the order service updating the
//! store asynchronously after accepting an order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use orderprobe_cli::{InventoryGateway, OrderGateway};
use orderprobe_core::types::{InventoryRecord, InventorySnapshot, LineItem, OrderId, OrderRequest, OrderStatus};
use orderprobe_services::inventory::reconcile_against;
use orderprobe_services::{ReconcileOutcome, Reconciliation, SubmissionError};
use orderprobe_store::{StatusSource, StoreError};

// ---------------------------------------------------------------------------
// order store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StoreState {
    timelines: HashMap<String, Vec<OrderStatus>>,
    reads: HashMap<String, usize>,
}

/// Order store whose rows follow a scripted timeline per order.
#[derive(Clone, Default)]
pub struct FakeOrderStore {
    state: Arc<Mutex<StoreState>>,
    unreachable: Arc<AtomicBool>,
    reads_fail: Arc<AtomicBool>,
    total_reads: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl FakeOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses the connectivity check and every read.
    pub fn unreachable() -> Self {
        let store = Self::default();
        store.unreachable.store(true, Ordering::SeqCst);
        store
    }

    /// Connectivity succeeds but every status query errors.
    pub fn failing_reads() -> Self {
        let store = Self::default();
        store.reads_fail.store(true, Ordering::SeqCst);
        store
    }

    fn insert(&self, order_id: &OrderId, timeline: Vec<OrderStatus>) {
        let mut state = self.state.lock().unwrap();
        state.timelines.insert(order_id.to_string(), timeline);
    }

    /// Status reads issued so far, across all orders.
    pub fn total_reads(&self) -> usize {
        self.total_reads.load(Ordering::SeqCst)
    }

    pub fn reads_for(&self, order_id: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.reads.get(order_id).copied().unwrap_or(0)
    }
}

impl StatusSource for FakeOrderStore {
    async fn fetch_status(&self, order_id: &OrderId) -> Result<Option<OrderStatus>, StoreError> {
        self.total_reads.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::Connect {
                target: "fake".to_owned(),
                reason: "connection refused".to_owned(),
            });
        }
        if self.reads_fail.load(Ordering::SeqCst) {
            return Err(StoreError::Query {
                order_id: order_id.to_string(),
                reason: "relation \"Orders\" does not exist".to_owned(),
            });
        }

        let mut state = self.state.lock().unwrap();
        let key = order_id.to_string();
        let read = {
            let counter = state.reads.entry(key.clone()).or_insert(0);
            *counter += 1;
            *counter
        };
        Ok(state.timelines.get(&key).and_then(|timeline| {
            timeline
                .get(read - 1)
                .or_else(|| timeline.last())
                .copied()
        }))
    }

    async fn check_connectivity(&self) -> Result<(), StoreError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::Connect {
                target: "postgres@localhost:5123/OrderDb".to_owned(),
                reason: "connection refused".to_owned(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// order service
// ---------------------------------------------------------------------------

/// What the fake order service does with a given customer's order.
#[derive(Clone)]
pub enum Behaviour {
    /// Accept and let the store walk through `timeline`.
    Accept(Vec<OrderStatus>),
    /// Reject with an HTTP status.
    Reject(u16),
}

/// Order service keyed by customer name.
pub struct FakeOrderService {
    store: FakeOrderStore,
    behaviours: HashMap<String, Behaviour>,
    next_id: AtomicUsize,
    /// Customer names in submission order.
    pub submitted: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl FakeOrderService {
    pub fn new(store: &FakeOrderStore) -> Self {
        Self {
            store: store.clone(),
            behaviours: HashMap::new(),
            next_id: AtomicUsize::new(1),
            submitted: Arc::default(),
        }
    }

    pub fn on(mut self, customer: &str, behaviour: Behaviour) -> Self {
        self.behaviours.insert(customer.to_owned(), behaviour);
        self
    }

    /// Accept `customer`'s order: Pending, Processing, then `terminal`.
    pub fn converging(self, customer: &str, terminal: OrderStatus) -> Self {
        self.on(
            customer,
            Behaviour::Accept(vec![
                OrderStatus::Pending,
                OrderStatus::Processing,
                terminal,
            ]),
        )
    }

    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }
}

impl OrderGateway for FakeOrderService {
    async fn submit(&self, request: &OrderRequest) -> Result<OrderId, SubmissionError> {
        self.submitted
            .lock()
            .unwrap()
            .push(request.customer_name.clone());

        match self.behaviours.get(&request.customer_name) {
            Some(Behaviour::Accept(timeline)) => {
                let n = self.next_id.fetch_add(1, Ordering::SeqCst);
                let order_id = OrderId::new(format!("ord-{n}"));
                self.store.insert(&order_id, timeline.clone());
                Ok(order_id)
            }
            Some(Behaviour::Reject(status)) => Err(SubmissionError::Status {
                status: *status,
                body: "rejected by fake".to_owned(),
            }),
            None => Err(SubmissionError::Transport(format!(
                "no behaviour for customer '{}'",
                request.customer_name
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// inventory service
// ---------------------------------------------------------------------------

/// Inventory service with a fixed stock listing, or none at all.
pub struct FakeInventory {
    snapshot: Option<InventorySnapshot>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeInventory {
    /// Lists every product in `products` with plenty of stock.
    pub fn stocking(products: &[uuid::Uuid]) -> Self {
        let records = products.iter().map(|product_id| InventoryRecord {
            id: None,
            product_id: *product_id,
            quantity: 100,
            reserved_quantity: 0,
        });
        Self {
            snapshot: Some(InventorySnapshot::from_records(records)),
            calls: AtomicUsize::new(0),
        }
    }

    /// Every fetch fails.
    pub fn unreachable() -> Self {
        Self {
            snapshot: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl InventoryGateway for FakeInventory {
    async fn reconcile(&self, items: &[LineItem]) -> Reconciliation {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.snapshot {
            Some(snapshot) => reconcile_against(snapshot, items),
            None => Reconciliation {
                outcome: ReconcileOutcome::Unreachable(
                    "inventory service request failed: connection refused".to_owned(),
                ),
                findings: Vec::new(),
            },
        }
    }
}
