//! orderprobe-core: configuration, shared domain types and wait primitives.
//!
//! Every other orderprobe crate depends on this one. It performs no I/O of
//! its own beyond reading the configuration file.

pub mod config;
pub mod error;
pub mod types;
pub mod wait;

// --- re-exports ---

pub use error::{ConfigError, ProbeError};

pub use config::{
    GeneralConfig, InventoryServiceConfig, ObserverConfig, OrderServiceConfig, ProbeConfig,
    StoreConfig,
};

pub use types::{
    InventoryRecord, InventorySnapshot, LineItem, OrderId, OrderRequest, OrderStatus, Scenario,
    builtin_scenarios,
};

pub use wait::{Backoff, PollPolicy, WaitOutcome, Waiter};
