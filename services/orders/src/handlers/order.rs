use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::types::{CreateOrderInput, Order, OrderStatus};
use crate::error::OrderServiceError;
use crate::state::AppState;

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_id: String,
    pub customer: String,
    /// Serialized as a decimal string to keep precision.
    pub total: Decimal,
    pub status: OrderStatus,
    pub attempts: i32,
    #[serde(serialize_with = "orderq_core::serde::to_rfc3339_ms_opt")]
    pub locked_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    #[serde(serialize_with = "orderq_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            order_id: order.order_id,
            customer: order.customer,
            total: order.total,
            status: order.status,
            attempts: order.attempts,
            locked_at: order.locked_at,
            last_error: order.last_error,
            created_at: order.created_at,
        }
    }
}

// ── POST /orders ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub order_id: String,
    pub customer: String,
    pub total: Decimal,
}

/// `pending` is shadowed by the `GET /orders/pending` route, so an order under
/// that key could never be read back.
const RESERVED_ORDER_ID: &str = "pending";

/// Always `201`: a repeated submission gets the stored order back in the same
/// shape as a fresh one.
pub async fn create_order(
    State(state): State<AppState>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), OrderServiceError> {
    if body.order_id.trim().is_empty()
        || body.order_id == RESERVED_ORDER_ID
        || body.total.is_sign_negative()
    {
        return Err(OrderServiceError::InvalidOrder);
    }
    let order = state
        .order_service()
        .create_order(CreateOrderInput {
            order_id: body.order_id,
            customer: body.customer,
            total: body.total,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

// ── GET /orders/{order_id} ───────────────────────────────────────────────────

pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderResponse>, OrderServiceError> {
    let order = state
        .order_service()
        .find_order_by_order_id(&order_id)
        .await?
        .ok_or(OrderServiceError::OrderNotFound)?;
    Ok(Json(order.into()))
}

// ── GET /orders/pending ──────────────────────────────────────────────────────

const MAX_PENDING_PAGE: u64 = 100;

#[derive(Deserialize, Default)]
pub struct PendingQuery {
    pub limit: Option<u64>,
    pub max_attempts: Option<i32>,
}

/// Read-only view of the pending pool; nothing is claimed.
pub async fn get_pending_orders(
    State(state): State<AppState>,
    Query(query): Query<PendingQuery>,
) -> Result<Json<Vec<OrderResponse>>, OrderServiceError> {
    let limit = query.limit.unwrap_or(25).min(MAX_PENDING_PAGE);
    if limit == 0 {
        return Ok(Json(Vec::new()));
    }
    let max_attempts = query.max_attempts.unwrap_or(state.max_attempts);
    let orders = state
        .order_service()
        .fetch_pending_orders(limit, max_attempts)
        .await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}
