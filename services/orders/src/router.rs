use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;

use orderq_core::middleware::{propagate_request_id_layer, request_id_layer, trace_layer};

use crate::handlers::{
    health::{healthz, readyz},
    order::{create_order, get_order, get_pending_orders},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Orders
        .route("/orders", post(create_order))
        .route("/orders/pending", get(get_pending_orders))
        .route("/orders/{order_id}", get(get_order))
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(trace_layer())
                .layer(propagate_request_id_layer()),
        )
        .with_state(state)
}
