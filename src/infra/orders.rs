//! In-memory order source.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::core::{AppResult, OrderRecord, OrderSource};
use crate::util::ids::OrderId;

/// Order records held in memory, keyed by id.
#[derive(Default)]
pub struct InMemoryOrderSource {
    orders: RwLock<HashMap<OrderId, OrderRecord>>,
}

impl InMemoryOrderSource {
    /// Create a source seeded with `orders`.
    pub fn new(orders: impl IntoIterator<Item = OrderRecord>) -> Self {
        Self {
            orders: RwLock::new(orders.into_iter().map(|o| (o.id.clone(), o)).collect()),
        }
    }

    /// Insert or replace an order.
    pub fn upsert(&self, order: OrderRecord) {
        self.orders.write().insert(order.id.clone(), order);
    }

    /// Overwrite an order's raw status text. Returns false for unknown ids.
    pub fn set_status(&self, id: &str, status: &str) -> bool {
        self.orders
            .write()
            .get_mut(id)
            .map(|order| order.status = status.to_string())
            .is_some()
    }
}

#[async_trait]
impl OrderSource for InMemoryOrderSource {
    async fn fetch_orders_by_ids(&self, ids: &[OrderId]) -> AppResult<Vec<OrderRecord>> {
        let orders = self.orders.read();
        Ok(ids.iter().filter_map(|id| orders.get(id).cloned()).collect())
    }
}
