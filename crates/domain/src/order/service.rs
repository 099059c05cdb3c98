//! Order use cases.

use store::Repository;

use crate::error::UseCaseError;

use super::{NewOrder, NewOrderItem, Order, OrderError, OrderFactory, OrderPrimitives};

/// Service for managing orders.
///
/// Every state-changing use case runs the same pipeline: load the order,
/// apply one domain method, persist it, and return its primitives. The first
/// failure ends the pipeline. There is no version check between the load and
/// the update, so concurrent changes to the same order are last-write-wins.
pub struct OrderService<R> {
    repository: R,
    factory: OrderFactory,
}

impl<R: Repository<Order>> OrderService<R> {
    /// Creates a new order service over the given repository.
    pub fn new(repository: R) -> Self {
        Self::with_factory(repository, OrderFactory::default())
    }

    /// Creates a new order service with a custom factory (e.g. deterministic ids).
    pub fn with_factory(repository: R, factory: OrderFactory) -> Self {
        Self {
            repository,
            factory,
        }
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Places a new pending order.
    #[tracing::instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub async fn create_order(&self, request: NewOrder) -> Result<OrderPrimitives, UseCaseError> {
        let order = self.factory.create(request)?;
        self.repository.save(&order).await?;

        tracing::info!(order_id = %order.id(), total = %order.total_price(), "order created");
        metrics::counter!("orders_created_total").increment(1);
        Ok(order.to_primitives())
    }

    /// Loads an order by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: &str) -> Result<OrderPrimitives, UseCaseError> {
        let order = self.repository.find_by_id(order_id).await?;
        Ok(order.to_primitives())
    }

    /// Lists every order.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderPrimitives>, UseCaseError> {
        let orders = self.repository.find_all().await?;
        Ok(orders.iter().map(Order::to_primitives).collect())
    }

    /// Replaces the items of a pending order.
    #[tracing::instrument(skip(self, items))]
    pub async fn update_order_items(
        &self,
        order_id: &str,
        items: Vec<NewOrderItem>,
    ) -> Result<OrderPrimitives, UseCaseError> {
        let items = self.factory.items(items)?;
        self.execute(order_id, "update_items", |order| order.replace_items(items))
            .await
    }

    /// Confirms a pending order.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_order(&self, order_id: &str) -> Result<OrderPrimitives, UseCaseError> {
        self.execute(order_id, "confirm", Order::confirm).await
    }

    /// Starts processing a confirmed order.
    #[tracing::instrument(skip(self))]
    pub async fn process_order(&self, order_id: &str) -> Result<OrderPrimitives, UseCaseError> {
        self.execute(order_id, "process", Order::process).await
    }

    /// Ships an order that is being processed.
    #[tracing::instrument(skip(self))]
    pub async fn ship_order(&self, order_id: &str) -> Result<OrderPrimitives, UseCaseError> {
        self.execute(order_id, "ship", Order::ship).await
    }

    /// Marks a shipped order as delivered.
    #[tracing::instrument(skip(self))]
    pub async fn deliver_order(&self, order_id: &str) -> Result<OrderPrimitives, UseCaseError> {
        self.execute(order_id, "deliver", Order::deliver).await
    }

    /// Cancels an order that has not shipped yet.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: &str) -> Result<OrderPrimitives, UseCaseError> {
        self.execute(order_id, "cancel", Order::cancel).await
    }

    /// Loads the order, applies `action`, and persists the result.
    async fn execute<F>(
        &self,
        order_id: &str,
        action: &'static str,
        action_fn: F,
    ) -> Result<OrderPrimitives, UseCaseError>
    where
        F: FnOnce(&mut Order) -> Result<(), OrderError>,
    {
        let mut order = self.repository.find_by_id(order_id).await?;
        let from = order.status();

        if let Err(e) = action_fn(&mut order) {
            tracing::debug!(order_id, action, status = %from, error = %e, "order action rejected");
            metrics::counter!("order_transitions_total", "action" => action, "outcome" => "rejected")
                .increment(1);
            return Err(e.into());
        }

        self.repository.update(&order).await?;

        tracing::info!(order_id, action, from = %from, to = %order.status(), "order updated");
        metrics::counter!("order_transitions_total", "action" => action, "outcome" => "applied")
            .increment(1);
        Ok(order.to_primitives())
    }
}
