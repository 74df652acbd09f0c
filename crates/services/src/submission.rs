//! Order submission.
//!
//! [`SubmissionClient`] POSTs an [`OrderRequest`] to the order service and
//! returns the identifier it assigns. The service accepts the order
//! asynchronously (typically `202 Accepted` with `{orderId, status}`); the
//! final status is observed separately through the store.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use orderprobe_core::config::OrderServiceConfig;
use orderprobe_core::types::{OrderId, OrderRequest};

use crate::error::{SubmissionError, truncate_body};

/// HTTP client for the order creation endpoint.
#[derive(Debug, Clone)]
pub struct SubmissionClient {
    client: Client,
    url: String,
}

impl SubmissionClient {
    pub fn new(config: &OrderServiceConfig) -> Result<Self, SubmissionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SubmissionError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Submit `request` and return the identifier of the created order.
    pub async fn submit(&self, request: &OrderRequest) -> Result<OrderId, SubmissionError> {
        debug!(
            url = %self.url,
            customer = %request.customer_name,
            card = %request.masked_card_number(),
            items = request.items.len(),
            "submitting order"
        );

        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;

        if !status.is_success() {
            warn!(
                url = %self.url,
                status = %status,
                body = %truncate_body(&body),
                "order service rejected submission"
            );
            return Err(SubmissionError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let order_id = parse_order_id(&body)?;
        info!(order_id = %order_id, status = %status, "order accepted");
        Ok(order_id)
    }
}

fn parse_order_id(body: &str) -> Result<OrderId, SubmissionError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| SubmissionError::Decode(e.to_string()))?;

    value
        .get("orderId")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(OrderId::new)
        .ok_or(SubmissionError::MissingOrderId)
}
