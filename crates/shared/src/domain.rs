use std::{fmt, str::FromStr};

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map($name)
            }
        }
    };
}

id_newtype!(OrderId);
id_newtype!(OrderItemId);
id_newtype!(CategoryId);
id_newtype!(MenuItemId);
id_newtype!(NeighborhoodId);

/// Two monetary amounts closer than this are considered equal.
pub const MONEY_TOLERANCE: f64 = 0.01;

pub fn money_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < MONEY_TOLERANCE
}

/// Jackson writes unset fields as `null`; treat that like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Board column an order sits in. The serialized form is the backend's
/// literal status string; display labels live in [`STATUS_LABELS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "EM ANÁLISE")]
    InAnalysis,
    #[serde(rename = "EM PRODUÇÃO")]
    InProduction,
    #[serde(rename = "PRONTO")]
    Ready,
}

pub const STATUS_LABELS: [(OrderStatus, &str); 3] = [
    (OrderStatus::InAnalysis, "Em Análise"),
    (OrderStatus::InProduction, "Em Produção"),
    (OrderStatus::Ready, "Pronto"),
];

impl OrderStatus {
    /// Column order on the board, left to right.
    pub const ALL: [OrderStatus; 3] = [
        OrderStatus::InAnalysis,
        OrderStatus::InProduction,
        OrderStatus::Ready,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            OrderStatus::InAnalysis => "EM ANÁLISE",
            OrderStatus::InProduction => "EM PRODUÇÃO",
            OrderStatus::Ready => "PRONTO",
        }
    }

    pub fn label(self) -> &'static str {
        STATUS_LABELS
            .iter()
            .find(|(status, _)| *status == self)
            .map(|(_, label)| *label)
            .unwrap_or_else(|| self.wire_name())
    }

    pub fn column_index(self) -> usize {
        match self {
            OrderStatus::InAnalysis => 0,
            OrderStatus::InProduction => 1,
            OrderStatus::Ready => 2,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        match normalized.as_str() {
            "EM ANÁLISE" | "EM ANALISE" | "ANALYSIS" | "PENDING" => Ok(OrderStatus::InAnalysis),
            "EM PRODUÇÃO" | "EM PRODUCAO" | "PRODUCTION" | "IN_PROGRESS" => {
                Ok(OrderStatus::InProduction)
            }
            "PRONTO" | "READY" | "DONE" => Ok(OrderStatus::Ready),
            _ => Err(ParseEnumError::new("order status", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeliveryType {
    #[serde(rename = "DELIVERY", alias = "delivery")]
    Delivery,
    #[serde(rename = "RETIRADA", alias = "retirada")]
    Pickup,
    /// Orders without a delivery type are treated as dine-in.
    #[default]
    #[serde(rename = "LOCAL", alias = "local")]
    DineIn,
}

impl DeliveryType {
    pub fn wire_name(self) -> &'static str {
        match self {
            DeliveryType::Delivery => "DELIVERY",
            DeliveryType::Pickup => "RETIRADA",
            DeliveryType::DineIn => "LOCAL",
        }
    }
}

impl fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for DeliveryType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "delivery" => Ok(DeliveryType::Delivery),
            "retirada" | "pickup" => Ok(DeliveryType::Pickup),
            "local" | "dinein" | "dine-in" => Ok(DeliveryType::DineIn),
            _ => Err(ParseEnumError::new("delivery type", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "dinheiro")]
    Cash,
    #[serde(rename = "cartao_credito")]
    CreditCard,
    #[serde(rename = "cartao_debito")]
    DebitCard,
    #[serde(rename = "pix")]
    Pix,
}

impl FromStr for PaymentMethod {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dinheiro" | "cash" => Ok(PaymentMethod::Cash),
            "cartao_credito" | "credit" => Ok(PaymentMethod::CreditCard),
            "cartao_debito" | "debit" => Ok(PaymentMethod::DebitCard),
            "pix" => Ok(PaymentMethod::Pix),
            _ => Err(ParseEnumError::new("payment method", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Neighborhood {
    pub id: NeighborhoodId,
    pub name: String,
    pub state: String,
    pub city: String,
    pub delivery_fee: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Neighborhood {
    pub fn coordinate(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Not sent by the backend; filled in from the enclosing category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<MenuItem>,
}

impl Category {
    /// Stamps every item with this category's id.
    pub fn link_items(mut self) -> Self {
        for item in &mut self.items {
            item.category_id = Some(self.id);
        }
        self
    }

    pub fn item(&self, item_id: MenuItemId) -> Option<&MenuItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn price_total(&self) -> f64 {
        self.items.iter().map(|item| item.price).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<OrderItemId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    pub quantity: u32,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }

    /// The backend only stores `"<name> - <qty>x"` descriptions, so the name
    /// is recovered from there when absent.
    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            return &self.name;
        }
        self.description
            .as_deref()
            .and_then(|description| description.split(" - ").next())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub customer_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub customer_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub delivery_type: DeliveryType,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cep: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<Neighborhood>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_fee: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn items_total(&self) -> f64 {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    /// Delivery fee that counts toward the total; zero unless the order is
    /// a delivery.
    pub fn applied_delivery_fee(&self) -> f64 {
        match self.delivery_type {
            DeliveryType::Delivery => self.delivery_fee.unwrap_or_default(),
            DeliveryType::Pickup | DeliveryType::DineIn => 0.0,
        }
    }

    pub fn expected_total(&self) -> f64 {
        self.items_total() + self.applied_delivery_fee()
    }

    pub fn has_consistent_total(&self) -> bool {
        money_eq(self.total_amount, self.expected_total())
    }

    pub fn address_line(&self) -> Option<String> {
        if self.delivery_type != DeliveryType::Delivery {
            return None;
        }
        let street = self.street.as_deref().unwrap_or_default();
        let number = self.number.as_deref().unwrap_or_default();
        let mut line = format!("{street}, {number}");
        if let Some(complement) = self.complement.as_deref().filter(|c| !c.is_empty()) {
            line.push_str(" - ");
            line.push_str(complement);
        }
        if let Some(neighborhood) = &self.neighborhood {
            line.push_str(" (");
            line.push_str(&neighborhood.name);
            line.push(')');
        }
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: f64, quantity: u32) -> OrderItem {
        OrderItem {
            id: None,
            name: "X-Burger".into(),
            description: None,
            price,
            quantity,
        }
    }

    #[test]
    fn status_round_trips_through_backend_literals() {
        let json = serde_json::to_string(&OrderStatus::InProduction).expect("serialize");
        assert_eq!(json, "\"EM PRODUÇÃO\"");
        let parsed: OrderStatus = serde_json::from_str("\"EM ANÁLISE\"").expect("deserialize");
        assert_eq!(parsed, OrderStatus::InAnalysis);
        assert!(serde_json::from_str::<OrderStatus>("\"pending\"").is_err());
    }

    #[test]
    fn labels_are_separate_from_wire_names() {
        assert_eq!(OrderStatus::InProduction.label(), "Em Produção");
        assert_eq!(OrderStatus::Ready.wire_name(), "PRONTO");
        assert_eq!("em analise".parse::<OrderStatus>(), Ok(OrderStatus::InAnalysis));
    }

    #[test]
    fn missing_delivery_type_defaults_to_dine_in() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "id": 4,
            "status": "PRONTO",
            "totalAmount": 10.0,
            "items": [{ "price": 5.0, "quantity": 2, "description": "Suco - 2x" }]
        }))
        .expect("order");
        assert_eq!(order.delivery_type, DeliveryType::DineIn);
        assert_eq!(order.items[0].display_name(), "Suco");
        assert!(order.has_consistent_total());
    }

    #[test]
    fn null_fields_decode_as_defaults() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "id": 1,
            "status": "EM ANÁLISE",
            "customerName": null,
            "customerPhone": null,
            "deliveryType": null,
            "paymentMethod": null,
            "orderDate": null,
            "totalAmount": null,
            "deliveryFee": null,
            "neighborhood": null,
            "items": null
        }))
        .expect("order with nulls");
        assert_eq!(order.delivery_type, DeliveryType::DineIn);
        assert_eq!(order.customer_name, "");
        assert_eq!(order.customer_phone, "");
        assert_eq!(order.total_amount, 0.0);
        assert!(order.items.is_empty());
        assert!(order.has_consistent_total());

        let category: Category = serde_json::from_value(serde_json::json!({
            "id": 2,
            "name": "Bebidas",
            "items": null
        }))
        .expect("category with null items");
        assert!(category.items.is_empty());
    }

    #[test]
    fn delivery_fee_counts_only_for_delivery_orders() {
        let mut order: Order = serde_json::from_value(serde_json::json!({
            "id": 1,
            "status": "EM ANÁLISE",
            "deliveryType": "DELIVERY",
            "deliveryFee": 7.5,
            "totalAmount": 0.0
        }))
        .expect("order");
        order.items = vec![item(18.90, 1), item(22.90, 2)];

        assert!(money_eq(order.expected_total(), 64.70 + 7.5));

        order.delivery_type = DeliveryType::Pickup;
        assert!(money_eq(order.expected_total(), 64.70));
    }
}
