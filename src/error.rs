use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("No route could be built: {0}")]
    NoRouteFound(String),

    #[error("Attribute provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Upstream service error: {0}")]
    ServiceUnavailable(String),

    #[error("Request superseded by a newer one")]
    Superseded,

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Transient upstream failures are worth retrying; the rest are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::ServiceUnavailable(_) | AppError::ProviderUnavailable(_)
        )
    }
}

// Convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InvalidRoute(ref e) => (StatusCode::BAD_REQUEST, e.as_str()),
            AppError::InvalidRequest(ref e) => (StatusCode::BAD_REQUEST, e.as_str()),
            AppError::RouteNotFound(ref e) => {
                tracing::info!("Route not found: {}", e);
                (StatusCode::NOT_FOUND, "No route between these points")
            }
            AppError::NoRouteFound(ref e) => {
                tracing::warn!("No route could be built: {}", e);
                (StatusCode::NOT_FOUND, "No route between these points")
            }
            AppError::ProviderUnavailable(ref e) => {
                tracing::warn!("Attribute provider unavailable: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Temporary service error, please retry",
                )
            }
            AppError::ServiceUnavailable(ref e) => {
                tracing::error!("Upstream service error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Temporary service error, please retry",
                )
            }
            AppError::Superseded => (
                StatusCode::CONFLICT,
                "Request superseded by a newer one",
            ),
            AppError::Cache(ref e) => {
                tracing::warn!("Cache error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Cache error")
            }
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": status.canonical_reason().unwrap_or("Unknown error"),
            "message": error_message,
            "retryable": status == StatusCode::BAD_GATEWAY
                || status == StatusCode::SERVICE_UNAVAILABLE,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
