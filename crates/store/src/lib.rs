//! orderprobe-store: read-only access to the order store and bounded status
//! observation.
//!
//! # Module Structure
//!
//! - [`error`]: store failures (`StoreError`)
//! - [`handle`]: one-connection handles (`StoreHandle`, `with_store`)
//! - [`observer`]: the poll loop (`StatusObserver`, `StatusSource`, `Observation`)

pub mod error;
pub mod handle;
pub mod observer;

pub use error::StoreError;
pub use handle::{StoreFuture, StoreHandle, with_store};
pub use observer::{Observation, PgStatusSource, StatusObserver, StatusSource};
