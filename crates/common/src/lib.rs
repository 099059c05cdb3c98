//! Shared identifier types used across the order service crates.

mod id;
mod types;

pub use id::{IdGenerator, PrefixedIdGenerator, SequentialIdGenerator};
pub use types::{CustomerId, OrderId, ProductId};
