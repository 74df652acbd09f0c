//! Scenario and settings builders.

use std::time::Duration;

use uuid::Uuid;

use orderprobe_cli::RunSettings;
use orderprobe_core::types::{LineItem, OrderRequest, OrderStatus, Scenario};
use orderprobe_core::wait::PollPolicy;

/// Five reads, one second apart, no deadline.
pub fn settings() -> RunSettings {
    RunSettings {
        policy: PollPolicy::fixed(5, Duration::from_secs(1)),
        require_verified: false,
    }
}

pub fn strict_settings() -> RunSettings {
    RunSettings {
        require_verified: true,
        ..settings()
    }
}

/// A scenario whose customer name doubles as the fake services' lookup key.
#[allow(dead_code)]
pub fn scenario(name: &str, customer: &str, expected: OrderStatus, product: u128) -> Scenario {
    Scenario {
        name: name.to_owned(),
        expected_status: expected,
        payload: OrderRequest {
            customer_name: customer.to_owned(),
            shipping_address: "1 Test Lane".to_owned(),
            total_amount: 10.0,
            card_number: "4111-1111-1111-1111".to_owned(),
            items: vec![LineItem {
                product_id: Uuid::from_u128(product),
                product_name: format!("product-{product}"),
                quantity: 1,
                unit_price: 10.0,
            }],
        },
    }
}
