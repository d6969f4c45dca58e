#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::types::{CreateOrderInput, Order};
use crate::error::OrderServiceError;

/// Persistence port for the order queue.
///
/// Every mutation must be atomic with respect to concurrent callers: workers in
/// other processes coordinate only through these operations.
pub trait OrderStore: Send + Sync {
    /// Insert a new `PENDING` order with zero attempts.
    ///
    /// A duplicate `order_id` is not an error: the existing row is returned
    /// unchanged, so retried or racing submissions resolve to one order.
    async fn create(&self, input: CreateOrderInput) -> Result<Order, OrderServiceError>;

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Order>, OrderServiceError>;

    /// Up to `limit` claimable orders (`PENDING`, unlocked, `attempts < max_attempts`),
    /// oldest first. Read-only: results may already be claimed by the time the
    /// caller tries to lock them.
    async fn find_pending(
        &self,
        limit: u64,
        max_attempts: i32,
    ) -> Result<Vec<Order>, OrderServiceError>;

    /// Claim an order. Returns `true` iff this call moved it from unlocked
    /// `PENDING` to locked; `false` means someone else holds it or it is no
    /// longer pending.
    async fn lock_by_id(&self, id: Uuid) -> Result<bool, OrderServiceError>;

    /// Set `PROCESSED`, clear the lock and the last error.
    async fn mark_processed(&self, id: Uuid) -> Result<Order, OrderServiceError>;

    /// Count a failed attempt: `attempts += 1`, record `message`, clear the lock.
    /// Status is left as is.
    async fn mark_failed(&self, id: Uuid, message: &str) -> Result<Order, OrderServiceError>;

    /// Clear claims on pending orders locked before `locked_before`.
    /// Returns the number of released orders; attempts are not touched.
    async fn release_expired_locks(
        &self,
        locked_before: DateTime<Utc>,
    ) -> Result<u64, OrderServiceError>;
}

/// Work performed on a claimed order. An `Err` is recorded as a failed attempt.
pub trait OrderProcessor: Send + Sync {
    async fn process(&self, order: &Order) -> anyhow::Result<()>;
}
