//! New-order and edit-order forms.

use shared::{
    domain::{
        Category, CategoryId, DeliveryType, MenuItem, MenuItemId, Neighborhood, Order,
        PaymentMethod,
    },
    protocol::{OrderItemPayload, OrderPayload, PostalAddress},
};

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq)]
pub struct DraftItem {
    pub line_id: u64,
    pub menu_item_id: Option<MenuItemId>,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

impl DraftItem {
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryAddress {
    pub cep: String,
    pub street: String,
    pub number: String,
    pub complement: String,
    pub reference: String,
}

impl DeliveryAddress {
    /// Copies the fields a postal-code lookup knows about; number and
    /// reference stay as typed.
    pub fn fill_from_postal(&mut self, address: &PostalAddress) {
        self.cep = address.cep.clone();
        self.street = address.logradouro.clone();
        if self.complement.is_empty() {
            self.complement = address.complemento.clone();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderDraft {
    pub customer_name: String,
    pub customer_phone: String,
    pub payment_method: Option<PaymentMethod>,
    pub delivery_type: Option<DeliveryType>,
    pub address: DeliveryAddress,
    neighborhood: Option<Neighborhood>,
    delivery_fee: f64,
    items: Vec<DraftItem>,
    next_line: u64,
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl OrderDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an edit form from a fetched order.
    pub fn from_order(order: &Order) -> Self {
        let mut draft = OrderDraft {
            customer_name: order.customer_name.clone(),
            customer_phone: order.customer_phone.clone(),
            payment_method: order.payment_method,
            delivery_type: Some(order.delivery_type),
            address: DeliveryAddress {
                cep: order.cep.clone().unwrap_or_default(),
                street: order.street.clone().unwrap_or_default(),
                number: order.number.clone().unwrap_or_default(),
                complement: order.complement.clone().unwrap_or_default(),
                reference: order.reference.clone().unwrap_or_default(),
            },
            neighborhood: order.neighborhood.clone(),
            delivery_fee: order
                .delivery_fee
                .or_else(|| order.neighborhood.as_ref().map(|n| n.delivery_fee))
                .unwrap_or_default(),
            ..OrderDraft::default()
        };
        for item in &order.items {
            draft.push_line(
                None,
                item.display_name().to_string(),
                item.price,
                item.quantity,
            );
        }
        draft
    }

    fn push_line(
        &mut self,
        menu_item_id: Option<MenuItemId>,
        name: String,
        price: f64,
        quantity: u32,
    ) -> u64 {
        self.next_line += 1;
        self.items.push(DraftItem {
            line_id: self.next_line,
            menu_item_id,
            name,
            price,
            quantity,
        });
        self.next_line
    }

    pub fn add_item(&mut self, item: &MenuItem, quantity: u32) -> Result<u64, ValidationError> {
        if quantity == 0 {
            return Err(ValidationError::new("quantity", "must be at least 1"));
        }
        Ok(self.push_line(Some(item.id), item.name.clone(), item.price, quantity))
    }

    /// Adds an item picked through the category and item selectors.
    pub fn add_from_menu(
        &mut self,
        categories: &[Category],
        category_id: CategoryId,
        item_id: MenuItemId,
        quantity: u32,
    ) -> Result<u64, ValidationError> {
        let item = categories
            .iter()
            .find(|category| category.id == category_id)
            .and_then(|category| category.item(item_id))
            .ok_or_else(|| {
                ValidationError::new(
                    "item",
                    format!("{item_id} is not in category {category_id}"),
                )
            })?;
        self.add_item(item, quantity)
    }

    pub fn remove_item(&mut self, line_id: u64) -> Option<DraftItem> {
        let index = self.items.iter().position(|item| item.line_id == line_id)?;
        Some(self.items.remove(index))
    }

    pub fn set_quantity(&mut self, line_id: u64, quantity: u32) -> Result<(), ValidationError> {
        if quantity == 0 {
            return Err(ValidationError::new("quantity", "must be at least 1"));
        }
        let item = self
            .items
            .iter_mut()
            .find(|item| item.line_id == line_id)
            .ok_or_else(|| ValidationError::new("item", format!("no line {line_id}")))?;
        item.quantity = quantity;
        Ok(())
    }

    pub fn items(&self) -> &[DraftItem] {
        &self.items
    }

    pub fn set_neighborhood(&mut self, neighborhood: Neighborhood) {
        self.delivery_fee = neighborhood.delivery_fee;
        self.neighborhood = Some(neighborhood);
    }

    pub fn clear_neighborhood(&mut self) {
        self.neighborhood = None;
        self.delivery_fee = 0.0;
    }

    pub fn neighborhood(&self) -> Option<&Neighborhood> {
        self.neighborhood.as_ref()
    }

    fn is_delivery(&self) -> bool {
        self.delivery_type == Some(DeliveryType::Delivery)
    }

    /// Fee counted toward the total; zero unless the draft is a delivery.
    pub fn delivery_fee(&self) -> f64 {
        if self.is_delivery() {
            self.delivery_fee
        } else {
            0.0
        }
    }

    pub fn items_total(&self) -> f64 {
        self.items.iter().map(DraftItem::line_total).sum()
    }

    pub fn total(&self) -> f64 {
        self.items_total() + self.delivery_fee()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.customer_name.trim().is_empty() {
            return Err(ValidationError::required("customer name"));
        }
        if self.customer_phone.trim().is_empty() {
            return Err(ValidationError::required("customer phone"));
        }
        if self.payment_method.is_none() {
            return Err(ValidationError::required("payment method"));
        }
        if self.delivery_type.is_none() {
            return Err(ValidationError::required("delivery type"));
        }
        if self.items.is_empty() {
            return Err(ValidationError::new("items", "at least one item is required"));
        }
        if let Some(item) = self.items.iter().find(|item| item.quantity == 0) {
            return Err(ValidationError::new(
                "quantity",
                format!("{} must be at least 1", item.name),
            ));
        }
        if self.is_delivery() && self.delivery_fee < 0.0 {
            return Err(ValidationError::new("delivery fee", "must not be negative"));
        }
        Ok(())
    }

    /// Builds the request body. Address fields are only sent for deliveries.
    pub fn to_payload(&self) -> Result<OrderPayload, ValidationError> {
        self.validate()?;
        let (Some(payment_method), Some(delivery_type)) = (self.payment_method, self.delivery_type)
        else {
            return Err(ValidationError::required("payment method"));
        };

        let items = self
            .items
            .iter()
            .map(|item| OrderItemPayload {
                name: item.name.clone(),
                quantity: item.quantity,
                price: item.price,
                description: format!("{} - {}x", item.name, item.quantity),
            })
            .collect();

        let delivery = self.is_delivery();
        let address = |value: &str| if delivery { non_blank(value) } else { None };

        Ok(OrderPayload {
            customer_name: self.customer_name.trim().to_string(),
            customer_phone: self.customer_phone.trim().to_string(),
            payment_method,
            delivery_type,
            total_amount: self.total(),
            cep: address(&self.address.cep),
            street: address(&self.address.street),
            number: address(&self.address.number),
            complement: address(&self.address.complement),
            reference: address(&self.address.reference),
            neighborhood: if delivery {
                self.neighborhood.clone()
            } else {
                None
            },
            delivery_fee: delivery.then_some(self.delivery_fee),
            items,
        })
    }
}

#[cfg(test)]
#[path = "tests/draft_tests.rs"]
mod tests;
