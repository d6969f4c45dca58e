use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::repository::OrderStore;
use crate::domain::types::{CreateOrderInput, Order};
use crate::error::OrderServiceError;
use crate::infra::db::DbOrderStore;

/// Facade over an [`OrderStore`].
///
/// Pure delegation: all correctness-bearing logic lives in the store. The
/// store defaults to the database one; tests and alternate deployments plug
/// in another without touching call sites.
#[derive(Clone)]
pub struct OrderService<S: OrderStore = DbOrderStore> {
    pub store: S,
}

impl<S: OrderStore> OrderService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn create_order(&self, input: CreateOrderInput) -> Result<Order, OrderServiceError> {
        self.store.create(input).await
    }

    pub async fn find_order_by_order_id(
        &self,
        order_id: &str,
    ) -> Result<Option<Order>, OrderServiceError> {
        self.store.find_by_order_id(order_id).await
    }

    pub async fn fetch_pending_orders(
        &self,
        limit: u64,
        max_attempts: i32,
    ) -> Result<Vec<Order>, OrderServiceError> {
        self.store.find_pending(limit, max_attempts).await
    }

    pub async fn lock_order_by_id(&self, id: Uuid) -> Result<bool, OrderServiceError> {
        self.store.lock_by_id(id).await
    }

    pub async fn mark_order_processed(&self, id: Uuid) -> Result<Order, OrderServiceError> {
        self.store.mark_processed(id).await
    }

    pub async fn mark_order_failed(
        &self,
        id: Uuid,
        message: &str,
    ) -> Result<Order, OrderServiceError> {
        self.store.mark_failed(id, message).await
    }

    pub async fn release_expired_locks(
        &self,
        locked_before: DateTime<Utc>,
    ) -> Result<u64, OrderServiceError> {
        self.store.release_expired_locks(locked_before).await
    }
}
