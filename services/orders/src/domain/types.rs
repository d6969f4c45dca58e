use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Processing status of an order.
///
/// Failure never changes the status: an order whose retry budget is spent stays
/// `Pending` and is told apart by `attempts` (see [`Order::is_exhausted`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Processed,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processed => "PROCESSED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A queued unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    /// Caller-supplied natural key, unique across the table.
    pub order_id: String,
    pub customer: String,
    pub total: Decimal,
    pub status: OrderStatus,
    /// Failed processing attempts so far. Never decreases.
    pub attempts: i32,
    /// Set while a worker holds the processing claim.
    pub locked_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Fresh pending order as written by `create`.
    pub fn new_pending(input: CreateOrderInput, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            order_id: input.order_id,
            customer: input.customer,
            total: input.total,
            status: OrderStatus::Pending,
            attempts: 0,
            locked_at: None,
            last_error: None,
            created_at: now,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked_at.is_some()
    }

    /// Whether the order belongs to the pending pool for the given ceiling.
    pub fn is_claimable(&self, max_attempts: i32) -> bool {
        self.status == OrderStatus::Pending && !self.is_locked() && self.attempts < max_attempts
    }

    /// Still pending, but out of retries.
    pub fn is_exhausted(&self, max_attempts: i32) -> bool {
        self.status == OrderStatus::Pending && self.attempts >= max_attempts
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateOrderInput {
    pub order_id: String,
    pub customer: String,
    pub total: Decimal,
}
