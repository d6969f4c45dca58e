use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Orders service error variants.
///
/// Storage failures arrive as `Internal` with the `sea_orm::DbErr` (or other
/// cause) at the root of the chain. Duplicate submissions and claim contention
/// are not errors and never show up here.
#[derive(Debug, thiserror::Error)]
pub enum OrderServiceError {
    #[error("order not found")]
    OrderNotFound,
    #[error("invalid order")]
    InvalidOrder,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl OrderServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::InvalidOrder => "INVALID_ORDER",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for OrderServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::OrderNotFound => StatusCode::NOT_FOUND,
            Self::InvalidOrder => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // 4xx are already visible in the trace layer's response events.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = format!("{e:#}"), kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
