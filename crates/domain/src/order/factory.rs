//! Building orders from client input.

use std::sync::Arc;

use common::{CustomerId, IdGenerator, PrefixedIdGenerator, ProductId};
use serde::{Deserialize, Serialize};

use super::{Money, Order, OrderError, OrderItem};

/// Prefix of generated order ids.
pub const ORDER_ID_PREFIX: &str = "OR";

/// Request to place a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub items: Vec<NewOrderItem>,
}

/// A requested order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_id: ProductId,

    #[serde(default)]
    pub product_name: Option<String>,

    pub quantity: u32,

    pub unit_price: Money,
}

impl NewOrderItem {
    pub fn new(product_id: impl Into<ProductId>, quantity: u32, unit_price: Money) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: None,
            quantity,
            unit_price,
        }
    }
}

/// Creates orders with fresh ids and normalized items.
#[derive(Clone)]
pub struct OrderFactory {
    ids: Arc<dyn IdGenerator>,
}

impl Default for OrderFactory {
    fn default() -> Self {
        Self::new(Arc::new(PrefixedIdGenerator::new(ORDER_ID_PREFIX)))
    }
}

impl OrderFactory {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self { ids }
    }

    /// Creates a pending order with a generated id.
    pub fn create(&self, request: NewOrder) -> Result<Order, OrderError> {
        let items = self.items(request.items)?;
        Order::create(self.ids.generate(), request.customer_id, items)
    }

    /// Turns requested lines into order items.
    ///
    /// Lines for the same product are merged: quantities add up and the
    /// first line's price and name win.
    pub fn items(&self, lines: Vec<NewOrderItem>) -> Result<Vec<OrderItem>, OrderError> {
        if lines.is_empty() {
            return Err(OrderError::NoItems);
        }

        let mut merged: Vec<OrderItem> = Vec::with_capacity(lines.len());
        for line in lines {
            let product_id = ProductId::new(line.product_id.into_inner());
            match merged.iter_mut().find(|item| item.product_id == product_id) {
                Some(item) => item.quantity = item.quantity.saturating_add(line.quantity),
                None => merged.push(OrderItem {
                    product_id,
                    product_name: line.product_name,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                }),
            }
        }

        Ok(merged)
    }
}
