//! Store error types.

/// Failures talking to the order store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The connection could not be established (or timed out).
    #[error("failed to connect to order store at {target}: {reason}")]
    Connect {
        /// `user@host:port/database`
        target: String,
        reason: String,
    },

    /// The status query failed on an open connection.
    #[error("status query failed for order '{order_id}': {reason}")]
    Query { order_id: String, reason: String },

    /// The connectivity probe (`SELECT 1`) failed.
    #[error("connectivity check against {target} failed: {reason}")]
    Ping { target: String, reason: String },

    /// Closing the connection failed.
    #[error("failed to close store connection: {0}")]
    Close(String),
}
