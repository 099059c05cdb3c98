//! Secondary lookups over cached orders.

use serde::{Deserialize, Serialize};
use store::{CacheStore, IndexDefinition, SearchQuery, cache_prefix};

use crate::error::UseCaseError;

use super::{Order, OrderPrimitives, OrderStatus};

/// Name of the order search index.
pub const ORDER_INDEX: &str = "idx:orders";

/// Index over cached order documents: customer, status and total price.
pub fn order_index() -> IndexDefinition {
    IndexDefinition::new(ORDER_INDEX, cache_prefix::<Order>())
        .tag("$.customerId", "customerId")
        .tag("$.status", "status")
        .numeric("$.totalPrice", "totalPrice")
}

/// Filters for an order search. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSearchCriteria {
    pub customer_id: Option<String>,
    pub status: Option<OrderStatus>,

    /// Inclusive lower bound on the total, in cents.
    pub min_total: Option<i64>,

    /// Inclusive upper bound on the total, in cents.
    pub max_total: Option<i64>,

    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl OrderSearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn total_between(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.min_total = min;
        self.max_total = max;
        self
    }

    /// Translates the criteria into a cache search query.
    pub fn to_query(&self) -> SearchQuery {
        let mut query = SearchQuery::new();
        if let Some(customer_id) = &self.customer_id {
            query = query.tag("customerId", customer_id.trim());
        }
        if let Some(status) = self.status {
            query = query.tag("status", status.as_str());
        }
        if self.min_total.is_some() || self.max_total.is_some() {
            query = query.range(
                "totalPrice",
                self.min_total.map(|c| c as f64),
                self.max_total.map(|c| c as f64),
            );
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = self.offset {
            query = query.offset(offset);
        }
        query
    }
}

/// Searches orders through the cache's secondary index.
///
/// Only orders currently held in the cache are visible: anything evicted or
/// expired is missing from results until it is read or written again.
pub struct OrderSearch<C> {
    cache: C,
}

impl<C: CacheStore> OrderSearch<C> {
    pub fn new(cache: C) -> Self {
        Self { cache }
    }

    /// Creates the order index if it does not exist yet.
    #[tracing::instrument(skip(self))]
    pub async fn ensure_index(&self) -> Result<(), UseCaseError> {
        self.cache.create_index(&order_index()).await?;
        Ok(())
    }

    /// Returns the cached orders matching `criteria`.
    #[tracing::instrument(skip(self))]
    pub async fn search(
        &self,
        criteria: &OrderSearchCriteria,
    ) -> Result<Vec<OrderPrimitives>, UseCaseError> {
        let documents = self.cache.search(ORDER_INDEX, &criteria.to_query()).await?;

        let orders = documents
            .into_iter()
            .filter_map(|document| match serde_json::from_value::<Order>(document) {
                Ok(order) => Some(order.to_primitives()),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping undecodable order in search results");
                    None
                }
            })
            .collect();
        Ok(orders)
    }
}
