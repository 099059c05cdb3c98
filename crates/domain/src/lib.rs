//! Domain layer for the order service.
//!
//! This crate provides:
//! - The `Order` entity with its status state machine
//! - `OrderFactory` for turning client requests into orders
//! - `OrderService` use cases over any `store::Repository<Order>`
//! - `OrderSearch` over the cache's secondary index

pub mod error;
pub mod order;

pub use error::UseCaseError;
pub use order::{
    Money, NewOrder, NewOrderItem, ORDER_INDEX, Order, OrderError, OrderFactory, OrderItem,
    OrderItemPrimitives, OrderPrimitives, OrderSearch, OrderSearchCriteria, OrderService,
    OrderStatus, order_index,
};
