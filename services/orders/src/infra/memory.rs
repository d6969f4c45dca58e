use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::domain::repository::OrderStore;
use crate::domain::types::{CreateOrderInput, Order, OrderStatus};
use crate::error::OrderServiceError;

/// In-process order store with the same claim semantics as the database store.
///
/// Each operation runs under one mutex acquisition, which plays the role of the
/// single-row atomic update. Clones share state. Rows are kept in insertion
/// order so FIFO ties resolve the same way every time.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<Mutex<Vec<Order>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.lock().is_empty()
    }

    /// Copy of every stored order, in insertion order.
    pub fn snapshot(&self) -> Vec<Order> {
        self.orders.lock().clone()
    }

    pub fn get(&self, id: Uuid) -> Option<Order> {
        self.orders.lock().iter().find(|o| o.id == id).cloned()
    }

    fn update<F>(&self, id: Uuid, apply: F) -> Result<Order, OrderServiceError>
    where
        F: FnOnce(&mut Order) -> Result<(), OrderServiceError>,
    {
        let mut orders = self.orders.lock();
        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(OrderServiceError::OrderNotFound)?;
        apply(order)?;
        Ok(order.clone())
    }
}

impl OrderStore for InMemoryOrderStore {
    async fn create(&self, input: CreateOrderInput) -> Result<Order, OrderServiceError> {
        let mut orders = self.orders.lock();
        if let Some(existing) = orders.iter().find(|o| o.order_id == input.order_id) {
            debug!(order_id = %existing.order_id, "duplicate order submission, returning existing row");
            return Ok(existing.clone());
        }
        let order = Order::new_pending(input, Utc::now());
        orders.push(order.clone());
        Ok(order)
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Order>, OrderServiceError> {
        Ok(self
            .orders
            .lock()
            .iter()
            .find(|o| o.order_id == order_id)
            .cloned())
    }

    async fn find_pending(
        &self,
        limit: u64,
        max_attempts: i32,
    ) -> Result<Vec<Order>, OrderServiceError> {
        let mut pending: Vec<Order> = self
            .orders
            .lock()
            .iter()
            .filter(|o| o.is_claimable(max_attempts))
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps.
        pending.sort_by_key(|o| o.created_at);
        pending.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(pending)
    }

    async fn lock_by_id(&self, id: Uuid) -> Result<bool, OrderServiceError> {
        let mut orders = self.orders.lock();
        match orders
            .iter_mut()
            .find(|o| o.id == id && o.locked_at.is_none() && o.status == OrderStatus::Pending)
        {
            Some(order) => {
                order.locked_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_processed(&self, id: Uuid) -> Result<Order, OrderServiceError> {
        self.update(id, |order| {
            order.status = OrderStatus::Processed;
            order.locked_at = None;
            order.last_error = None;
            Ok(())
        })
    }

    async fn mark_failed(&self, id: Uuid, message: &str) -> Result<Order, OrderServiceError> {
        self.update(id, |order| {
            // Left untouched on overflow, like the rejected UPDATE in Postgres.
            order.attempts = order.attempts.checked_add(1).ok_or_else(|| {
                OrderServiceError::Internal(anyhow::anyhow!(
                    "attempts overflow for order {}",
                    order.order_id
                ))
            })?;
            order.last_error = Some(message.to_owned());
            order.locked_at = None;
            Ok(())
        })
    }

    async fn release_expired_locks(
        &self,
        locked_before: DateTime<Utc>,
    ) -> Result<u64, OrderServiceError> {
        let mut released = 0;
        for order in self.orders.lock().iter_mut() {
            let expired = order.locked_at.is_some_and(|at| at < locked_before);
            if order.status == OrderStatus::Pending && expired {
                order.locked_at = None;
                released += 1;
            }
        }
        Ok(released)
    }
}
