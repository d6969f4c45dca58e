use std::sync::Arc;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::{Expr, OnConflict},
};
use tracing::debug;
use uuid::Uuid;

use orderq_orders_schema::orders;

use crate::domain::repository::OrderStore;
use crate::domain::types::{CreateOrderInput, Order, OrderStatus};
use crate::error::OrderServiceError;

/// PostgreSQL-backed order store.
///
/// Claims are WHERE-guarded `UPDATE`s judged by the affected row count; no
/// advisory locks or `SELECT ... FOR UPDATE` are involved.
#[derive(Clone)]
pub struct DbOrderStore {
    pub db: Arc<DatabaseConnection>,
}

impl OrderStore for DbOrderStore {
    async fn create(&self, input: CreateOrderInput) -> Result<Order, OrderServiceError> {
        let order = Order::new_pending(input, Utc::now());
        let inserted = orders::Entity::insert(orders::ActiveModel {
            id: Set(order.id),
            order_id: Set(order.order_id.clone()),
            customer: Set(order.customer.clone()),
            total: Set(order.total),
            status: Set(orders::OrderStatus::Pending),
            attempts: Set(0),
            locked_at: Set(None),
            last_error: Set(None),
            created_at: Set(order.created_at),
        })
        .on_conflict(
            OnConflict::column(orders::Column::OrderId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(self.db.as_ref())
        .await
        .context("insert order")?;

        if inserted == 0 {
            debug!(order_id = %order.order_id, "duplicate order submission, returning existing row");
        }

        // Read back in both cases so a racing creator gets the winner's row.
        self.find_by_order_id(&order.order_id)
            .await?
            .ok_or_else(|| {
                OrderServiceError::Internal(anyhow::anyhow!(
                    "order {} missing after insert",
                    order.order_id
                ))
            })
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Order>, OrderServiceError> {
        let model = orders::Entity::find()
            .filter(orders::Column::OrderId.eq(order_id))
            .one(self.db.as_ref())
            .await
            .context("find order by order_id")?;
        Ok(model.map(order_from_model))
    }

    async fn find_pending(
        &self,
        limit: u64,
        max_attempts: i32,
    ) -> Result<Vec<Order>, OrderServiceError> {
        let models = orders::Entity::find()
            .filter(orders::Column::Status.eq(orders::OrderStatus::Pending))
            .filter(orders::Column::LockedAt.is_null())
            .filter(orders::Column::Attempts.lt(max_attempts))
            .order_by_asc(orders::Column::CreatedAt)
            .order_by_asc(orders::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .context("find pending orders")?;
        Ok(models.into_iter().map(order_from_model).collect())
    }

    async fn lock_by_id(&self, id: Uuid) -> Result<bool, OrderServiceError> {
        let result = orders::Entity::update_many()
            .col_expr(orders::Column::LockedAt, Expr::value(Utc::now()))
            .filter(orders::Column::Id.eq(id))
            .filter(orders::Column::LockedAt.is_null())
            .filter(orders::Column::Status.eq(orders::OrderStatus::Pending))
            .exec(self.db.as_ref())
            .await
            .context("lock order")?;
        Ok(result.rows_affected == 1)
    }

    async fn mark_processed(&self, id: Uuid) -> Result<Order, OrderServiceError> {
        let models = orders::Entity::update_many()
            .col_expr(orders::Column::Status, Expr::value(orders::OrderStatus::Processed))
            .col_expr(orders::Column::LockedAt, Expr::value(None::<DateTime<Utc>>))
            .col_expr(orders::Column::LastError, Expr::value(None::<String>))
            .filter(orders::Column::Id.eq(id))
            .exec_with_returning(self.db.as_ref())
            .await
            .context("mark order processed")?;
        single_row(models)
    }

    async fn mark_failed(&self, id: Uuid, message: &str) -> Result<Order, OrderServiceError> {
        let models = orders::Entity::update_many()
            .col_expr(
                orders::Column::Attempts,
                Expr::col(orders::Column::Attempts).add(1),
            )
            .col_expr(orders::Column::LastError, Expr::value(message))
            .col_expr(orders::Column::LockedAt, Expr::value(None::<DateTime<Utc>>))
            .filter(orders::Column::Id.eq(id))
            .exec_with_returning(self.db.as_ref())
            .await
            .context("mark order failed")?;
        single_row(models)
    }

    async fn release_expired_locks(
        &self,
        locked_before: DateTime<Utc>,
    ) -> Result<u64, OrderServiceError> {
        let result = orders::Entity::update_many()
            .col_expr(orders::Column::LockedAt, Expr::value(None::<DateTime<Utc>>))
            .filter(orders::Column::Status.eq(orders::OrderStatus::Pending))
            .filter(orders::Column::LockedAt.lt(locked_before))
            .exec(self.db.as_ref())
            .await
            .context("release expired order locks")?;
        Ok(result.rows_affected)
    }
}

fn single_row(models: Vec<orders::Model>) -> Result<Order, OrderServiceError> {
    models
        .into_iter()
        .next()
        .map(order_from_model)
        .ok_or(OrderServiceError::OrderNotFound)
}

fn order_from_model(model: orders::Model) -> Order {
    Order {
        id: model.id,
        order_id: model.order_id,
        customer: model.customer,
        total: model.total,
        status: match model.status {
            orders::OrderStatus::Pending => OrderStatus::Pending,
            orders::OrderStatus::Processed => OrderStatus::Processed,
        },
        attempts: model.attempts,
        locked_at: model.locked_at,
        last_error: model.last_error,
        created_at: model.created_at,
    }
}
