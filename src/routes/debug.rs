use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// GET /debug/health - Check if services are working
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let mut status = json!({
        "status": "ok",
        "checks": {}
    });

    match state.cache {
        Some(ref cache) => {
            let healthy = cache.health_check().await;
            let stats = cache.get_stats().await;
            status["checks"]["cache"] = json!({
                "backend": cache.backend_name(),
                "healthy": healthy,
                "stats": stats,
            });
            if !healthy {
                status["status"] = json!("degraded");
            }
        }
        None => {
            status["checks"]["cache"] = json!("disabled");
        }
    }

    status["checks"]["sessions"] = json!(state.sessions.session_count());
    status["checks"]["factors"] = json!(state.road_priority.config().factors);

    Json(status)
}

/// DELETE /debug/cache - Drop all cached direct routes
pub async fn clear_cache(State(state): State<Arc<AppState>>) -> StatusCode {
    if let Some(ref cache) = state.cache {
        cache.clear().await;
    }
    StatusCode::NO_CONTENT
}
