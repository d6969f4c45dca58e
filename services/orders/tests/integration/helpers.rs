#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use orderq_orders::domain::repository::{OrderProcessor, OrderStore};
use orderq_orders::domain::types::{CreateOrderInput, Order};
use orderq_orders::error::OrderServiceError;
use orderq_orders::infra::memory::InMemoryOrderStore;
use orderq_orders::usecase::order::OrderService;

pub fn input(order_id: &str, customer: &str, total: Decimal) -> CreateOrderInput {
    CreateOrderInput {
        order_id: order_id.to_owned(),
        customer: customer.to_owned(),
        total,
    }
}

/// `{ orderId: "ORD-1", customer: "Alice", total: 199.99 }`
pub fn alice() -> CreateOrderInput {
    input("ORD-1", "Alice", Decimal::new(19999, 2))
}

pub fn memory_service() -> (OrderService<InMemoryOrderStore>, InMemoryOrderStore) {
    let store = InMemoryOrderStore::new();
    (OrderService::new(store.clone()), store)
}

// ── FailingStore ─────────────────────────────────────────────────────────────

/// Every call fails as if the database connection dropped.
pub struct FailingStore;

fn boom() -> OrderServiceError {
    OrderServiceError::Internal(anyhow::anyhow!("boom"))
}

impl OrderStore for FailingStore {
    async fn create(&self, _input: CreateOrderInput) -> Result<Order, OrderServiceError> {
        Err(boom())
    }

    async fn find_by_order_id(&self, _order_id: &str) -> Result<Option<Order>, OrderServiceError> {
        Err(boom())
    }

    async fn find_pending(
        &self,
        _limit: u64,
        _max_attempts: i32,
    ) -> Result<Vec<Order>, OrderServiceError> {
        Err(boom())
    }

    async fn lock_by_id(&self, _id: Uuid) -> Result<bool, OrderServiceError> {
        Err(boom())
    }

    async fn mark_processed(&self, _id: Uuid) -> Result<Order, OrderServiceError> {
        Err(boom())
    }

    async fn mark_failed(&self, _id: Uuid, _message: &str) -> Result<Order, OrderServiceError> {
        Err(boom())
    }

    async fn release_expired_locks(
        &self,
        _locked_before: DateTime<Utc>,
    ) -> Result<u64, OrderServiceError> {
        Err(boom())
    }
}

// ── RacingStore ──────────────────────────────────────────────────────────────

/// Another worker claims every candidate right after `find_pending` hands it out.
pub struct RacingStore {
    pub inner: InMemoryOrderStore,
}

impl OrderStore for RacingStore {
    async fn create(&self, input: CreateOrderInput) -> Result<Order, OrderServiceError> {
        self.inner.create(input).await
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Order>, OrderServiceError> {
        self.inner.find_by_order_id(order_id).await
    }

    async fn find_pending(
        &self,
        limit: u64,
        max_attempts: i32,
    ) -> Result<Vec<Order>, OrderServiceError> {
        let pending = self.inner.find_pending(limit, max_attempts).await?;
        for order in &pending {
            self.inner.lock_by_id(order.id).await?;
        }
        Ok(pending)
    }

    async fn lock_by_id(&self, id: Uuid) -> Result<bool, OrderServiceError> {
        self.inner.lock_by_id(id).await
    }

    async fn mark_processed(&self, id: Uuid) -> Result<Order, OrderServiceError> {
        self.inner.mark_processed(id).await
    }

    async fn mark_failed(&self, id: Uuid, message: &str) -> Result<Order, OrderServiceError> {
        self.inner.mark_failed(id, message).await
    }

    async fn release_expired_locks(
        &self,
        locked_before: DateTime<Utc>,
    ) -> Result<u64, OrderServiceError> {
        self.inner.release_expired_locks(locked_before).await
    }
}

// ── UnrecordableStore ────────────────────────────────────────────────────────

/// Claims succeed but outcomes cannot be written, as if the database went away
/// mid-batch.
pub struct UnrecordableStore {
    pub inner: InMemoryOrderStore,
}

impl OrderStore for UnrecordableStore {
    async fn create(&self, input: CreateOrderInput) -> Result<Order, OrderServiceError> {
        self.inner.create(input).await
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Order>, OrderServiceError> {
        self.inner.find_by_order_id(order_id).await
    }

    async fn find_pending(
        &self,
        limit: u64,
        max_attempts: i32,
    ) -> Result<Vec<Order>, OrderServiceError> {
        self.inner.find_pending(limit, max_attempts).await
    }

    async fn lock_by_id(&self, id: Uuid) -> Result<bool, OrderServiceError> {
        self.inner.lock_by_id(id).await
    }

    async fn mark_processed(&self, _id: Uuid) -> Result<Order, OrderServiceError> {
        Err(boom())
    }

    async fn mark_failed(&self, _id: Uuid, _message: &str) -> Result<Order, OrderServiceError> {
        Err(boom())
    }

    async fn release_expired_locks(
        &self,
        locked_before: DateTime<Utc>,
    ) -> Result<u64, OrderServiceError> {
        self.inner.release_expired_locks(locked_before).await
    }
}

// ── ScriptedProcessor ────────────────────────────────────────────────────────

/// Fails the first `failures` calls with `message`, then succeeds.
/// Records the `order_id` of every call.
pub struct ScriptedProcessor {
    pub failures: usize,
    pub message: String,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProcessor {
    pub fn new(failures: usize, message: &str) -> Self {
        Self {
            failures,
            message: message.to_owned(),
            calls: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn always_ok() -> Self {
        Self::new(0, "")
    }

    pub fn always_failing(message: &str) -> Self {
        Self::new(usize::MAX, message)
    }

    /// Shared handle to the call log for post-execution inspection.
    pub fn calls_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

impl OrderProcessor for ScriptedProcessor {
    async fn process(&self, order: &Order) -> anyhow::Result<()> {
        let call_index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(order.order_id.clone());
            calls.len() - 1
        };
        if call_index < self.failures {
            anyhow::bail!("{}", self.message);
        }
        Ok(())
    }
}
