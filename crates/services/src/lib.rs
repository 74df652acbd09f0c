//! orderprobe-services: HTTP clients for the services under test.
//!
//! - [`submission`]: `SubmissionClient` (order creation)
//! - [`inventory`]: `InventoryReconciler` (stock listing check)
//! - [`error`]: `SubmissionError`, `InventoryError`

pub mod error;
pub mod inventory;
pub mod submission;

pub use error::{InventoryError, SubmissionError};
pub use inventory::{InventoryReconciler, ItemFinding, ReconcileOutcome, Reconciliation};
pub use submission::SubmissionClient;
