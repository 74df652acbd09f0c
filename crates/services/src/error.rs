//! Service client error types.
//!
//! Response bodies carried in errors are truncated to [`MAX_BODY_CHARS`]
//! characters so that an HTML error page does not flood the logs.

/// Longest response body excerpt kept in an error.
pub const MAX_BODY_CHARS: usize = 200;

pub(crate) fn truncate_body(body: &str) -> String {
    body.chars().take(MAX_BODY_CHARS).collect()
}

/// Order submission failures. Every variant is fatal for its scenario.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    /// The HTTP client could not be constructed.
    #[error("failed to build order service client: {0}")]
    Client(String),

    /// The request never produced a response (refused, timed out, reset).
    #[error("order service request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("order service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body is not JSON.
    #[error("failed to decode order service response: {0}")]
    Decode(String),

    /// The response is JSON but has no usable `orderId`.
    #[error("order service response has no non-empty 'orderId' string")]
    MissingOrderId,
}

/// Inventory fetch failures. The reconciler turns these into
/// `ReconcileOutcome::Unreachable` rather than propagating them.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("failed to build inventory service client: {0}")]
    Client(String),

    #[error("inventory service request failed: {0}")]
    Transport(String),

    #[error("inventory service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode inventory listing: {0}")]
    Decode(String),
}
