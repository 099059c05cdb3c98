//! Order entity.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, ProductId};
use serde::{Deserialize, Serialize};
use store::Entity;

use super::{Money, OrderError, OrderItem, OrderStatus};

/// An order placed by a customer.
///
/// The status only changes through [`Order::change_status`], which enforces
/// the lifecycle table of [`OrderStatus`]. The total price is always derived
/// from the items.
///
/// Serializes through [`OrderPrimitives`], so stored and cached documents
/// carry the computed totals and are validated when read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "OrderPrimitives", try_from = "OrderPrimitives")]
pub struct Order {
    id: OrderId,
    customer_id: CustomerId,
    items: Vec<OrderItem>,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Serializable representation of an [`OrderItem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemPrimitives {
    pub product_id: ProductId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,

    pub quantity: u32,

    pub unit_price: Money,

    /// Derived; ignored on input.
    #[serde(default)]
    pub line_total: Money,
}

/// Externally safe representation of an [`Order`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPrimitives {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub items: Vec<OrderItemPrimitives>,
    pub status: OrderStatus,

    /// Derived; ignored on input.
    #[serde(default)]
    pub total_price: Money,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&OrderItem> for OrderItemPrimitives {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total: item.line_total(),
        }
    }
}

impl From<OrderItemPrimitives> for OrderItem {
    fn from(p: OrderItemPrimitives) -> Self {
        Self {
            product_id: ProductId::new(p.product_id.into_inner()),
            product_name: p.product_name,
            quantity: p.quantity,
            unit_price: p.unit_price,
        }
    }
}

fn validate_items(items: &[OrderItem]) -> Result<(), OrderError> {
    if items.is_empty() {
        return Err(OrderError::NoItems);
    }
    items.iter().try_for_each(OrderItem::validate)?;

    // Line totals fit individually; the order total must fit as well.
    items
        .iter()
        .try_fold(Money::zero(), |total, item| total.checked_add(item.line_total()))
        .ok_or(OrderError::AmountOverflow)?;
    Ok(())
}

impl Order {
    /// Creates a new pending order.
    pub fn create(
        id: impl Into<OrderId>,
        customer_id: impl Into<CustomerId>,
        items: Vec<OrderItem>,
    ) -> Result<Self, OrderError> {
        let now = Utc::now();
        Self::build(
            id.into(),
            customer_id.into(),
            items,
            OrderStatus::Pending,
            now,
            now,
        )
    }

    /// Rebuilds an order from its primitives.
    ///
    /// Derived fields (`totalPrice`, `lineTotal`) are recomputed rather than
    /// trusted.
    pub fn from_primitives(primitives: OrderPrimitives) -> Result<Self, OrderError> {
        Self::build(
            OrderId::new(primitives.id.into_inner()),
            CustomerId::new(primitives.customer_id.into_inner()),
            primitives.items.into_iter().map(OrderItem::from).collect(),
            primitives.status,
            primitives.created_at,
            primitives.updated_at,
        )
    }

    fn build(
        id: OrderId,
        customer_id: CustomerId,
        items: Vec<OrderItem>,
        status: OrderStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        if id.is_blank() {
            return Err(OrderError::OrderIdRequired);
        }
        if customer_id.is_blank() {
            return Err(OrderError::CustomerIdRequired);
        }
        validate_items(&items)?;

        Ok(Self {
            id,
            customer_id,
            items,
            status,
            created_at,
            updated_at,
        })
    }

    /// Returns the serializable representation, including derived totals.
    pub fn to_primitives(&self) -> OrderPrimitives {
        OrderPrimitives {
            id: self.id.clone(),
            customer_id: self.customer_id.clone(),
            items: self.items.iter().map(OrderItemPrimitives::from).collect(),
            status: self.status,
            total_price: self.total_price(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    // Queries

    pub fn id(&self) -> &OrderId {
        &self.id
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the sum of all line totals.
    pub fn total_price(&self) -> Money {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    /// Returns the total quantity across all items.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn is_processable(&self) -> bool {
        self.status.is_processable()
    }

    pub fn is_shippable(&self) -> bool {
        self.status.is_shippable()
    }

    pub fn is_cancellable(&self) -> bool {
        self.status.is_cancellable()
    }

    // Commands

    /// Moves the order to `target` if the lifecycle allows it.
    ///
    /// On failure the order is left untouched.
    pub fn change_status(&mut self, target: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(target) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }

        self.status = target;
        self.touch();
        Ok(())
    }

    pub fn confirm(&mut self) -> Result<(), OrderError> {
        self.change_status(OrderStatus::Confirmed)
    }

    pub fn process(&mut self) -> Result<(), OrderError> {
        if !self.is_processable() {
            return Err(OrderError::NotProcessable {
                status: self.status,
            });
        }
        self.change_status(OrderStatus::Processing)
    }

    pub fn ship(&mut self) -> Result<(), OrderError> {
        if !self.is_shippable() {
            return Err(OrderError::NotShippable {
                status: self.status,
            });
        }
        self.change_status(OrderStatus::Shipped)
    }

    pub fn deliver(&mut self) -> Result<(), OrderError> {
        self.change_status(OrderStatus::Delivered)
    }

    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if !self.is_cancellable() {
            return Err(OrderError::NotCancellable {
                status: self.status,
            });
        }
        self.change_status(OrderStatus::Cancelled)
    }

    /// Replaces all items. Only pending orders can be edited.
    pub fn replace_items(&mut self, items: Vec<OrderItem>) -> Result<(), OrderError> {
        if !self.status.is_editable() {
            return Err(OrderError::NotEditable {
                status: self.status,
            });
        }
        validate_items(&items)?;

        self.items = items;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        // Keep updated_at monotonic even if the wall clock steps back.
        self.updated_at = Utc::now().max(self.updated_at);
    }
}

impl From<Order> for OrderPrimitives {
    fn from(order: Order) -> Self {
        order.to_primitives()
    }
}

impl TryFrom<OrderPrimitives> for Order {
    type Error = OrderError;

    fn try_from(primitives: OrderPrimitives) -> Result<Self, Self::Error> {
        Order::from_primitives(primitives)
    }
}

impl Entity for Order {
    fn entity_type() -> &'static str {
        "Order"
    }

    fn table_name() -> &'static str {
        "orders"
    }

    fn id(&self) -> &str {
        self.id.as_str()
    }
}
