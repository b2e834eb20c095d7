//! Order persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use shopcore_core::UserId;
use shopcore_orders::{Order, OrderId, OrderStatus};

use crate::error::{StoreError, StoreResult};

/// Order persistence boundary. Orders have no natural unique key beyond
/// their id, so `save` is an unconditional upsert.
pub trait OrderStore {
    fn save(&self, order: &Order) -> StoreResult<()>;

    fn find(&self, id: OrderId) -> StoreResult<Order>;

    /// All orders for a customer, newest placement first.
    fn for_customer(&self, customer_id: UserId) -> StoreResult<Vec<Order>>;

    /// Fulfilment work queue.
    fn by_status(&self, status: OrderStatus) -> StoreResult<Vec<Order>>;
}

/// In-memory order store.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    inner: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, HashMap<OrderId, Order>>> {
        self.inner
            .read()
            .map_err(|_| StoreError::backend("order store lock poisoned"))
    }
}

impl OrderStore for InMemoryOrderStore {
    fn save(&self, order: &Order) -> StoreResult<()> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| StoreError::backend("order store lock poisoned"))?;
        tracing::debug!(order_id = %order.id, status = %order.status, "order saved");
        guard.insert(order.id, order.clone());
        Ok(())
    }

    fn find(&self, id: OrderId) -> StoreResult<Order> {
        self.read()?.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    fn for_customer(&self, customer_id: UserId) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .read()?
            .values()
            .filter(|o| o.customer_id == Some(customer_id))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));
        Ok(orders)
    }

    fn by_status(&self, status: OrderStatus) -> StoreResult<Vec<Order>> {
        Ok(self
            .read()?
            .values()
            .filter(|o| o.status == status)
            .cloned()
            .collect())
    }
}
