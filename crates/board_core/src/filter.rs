use std::str::FromStr;

use shared::domain::{DeliveryType, Order, ParseEnumError};

/// Sidebar filter over the board. `All` is the pass-through sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryFilter {
    #[default]
    All,
    Only(DeliveryType),
}

impl DeliveryFilter {
    pub fn matches(self, order: &Order) -> bool {
        match self {
            DeliveryFilter::All => true,
            DeliveryFilter::Only(delivery_type) => order.delivery_type == delivery_type,
        }
    }
}

impl FromStr for DeliveryFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(DeliveryFilter::All),
            other => other.parse().map(DeliveryFilter::Only),
        }
    }
}

/// Read-time projection; never touches the store.
pub fn filter_by_delivery_type(orders: &[Order], filter: DeliveryFilter) -> Vec<Order> {
    orders
        .iter()
        .filter(|order| filter.matches(order))
        .cloned()
        .collect()
}
