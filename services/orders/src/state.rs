use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::infra::db::DbOrderStore;
use crate::usecase::order::OrderService;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    /// Ceiling used by the pending-pool view when the caller gives none.
    pub max_attempts: i32,
}

impl AppState {
    pub fn order_store(&self) -> DbOrderStore {
        DbOrderStore {
            db: Arc::clone(&self.db),
        }
    }

    pub fn order_service(&self) -> OrderService {
        OrderService::new(self.order_store())
    }
}
