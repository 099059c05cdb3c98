//! Order entity, state machine and use cases.

mod entity;
mod factory;
mod search;
mod service;
mod status;
mod value_objects;

pub use entity::{Order, OrderItemPrimitives, OrderPrimitives};
pub use factory::{NewOrder, NewOrderItem, OrderFactory};
pub use search::{ORDER_INDEX, OrderSearch, OrderSearchCriteria, order_index};
pub use service::OrderService;
pub use status::OrderStatus;
pub use value_objects::{Money, OrderItem};

use thiserror::Error;

/// Errors raised by order domain rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Order ID is required.
    #[error("Order ID is required")]
    OrderIdRequired,

    /// Customer ID is required.
    #[error("Customer ID is required")]
    CustomerIdRequired,

    /// Product ID is required on every item.
    #[error("Product ID is required")]
    ProductIdRequired,

    /// Order has no items.
    #[error("Order must have at least one item")]
    NoItems,

    /// Invalid quantity.
    #[error("Invalid quantity for {product_id}: {quantity} (must be greater than 0)")]
    InvalidQuantity { product_id: String, quantity: u32 },

    /// Invalid price.
    #[error("Invalid price for {product_id}: {price} (must be greater than 0)")]
    InvalidPrice { product_id: String, price: i64 },

    /// A line total or the order total does not fit in the money range.
    #[error("Order amount is too large")]
    AmountOverflow,

    /// Status name not recognised.
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),

    /// The target status is not reachable from the current one.
    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order must be confirmed before it can be processed (current status: {status})")]
    NotProcessable { status: OrderStatus },

    #[error("Order must be processing before it can be shipped (current status: {status})")]
    NotShippable { status: OrderStatus },

    #[error("Order cannot be cancelled in {status} status")]
    NotCancellable { status: OrderStatus },

    /// Items can only be changed while the order is pending.
    #[error("Only orders with status pending can be updated (current status: {status})")]
    NotEditable { status: OrderStatus },
}

impl OrderError {
    /// Returns true for malformed input, as opposed to a rule that rejects
    /// the order's current state.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            OrderError::OrderIdRequired
                | OrderError::CustomerIdRequired
                | OrderError::ProductIdRequired
                | OrderError::NoItems
                | OrderError::InvalidQuantity { .. }
                | OrderError::InvalidPrice { .. }
                | OrderError::AmountOverflow
                | OrderError::UnknownStatus(_)
        )
    }
}
