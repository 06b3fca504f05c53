use crate::error::{AppError, Result};
use crate::models::{PrioritizeRouteRequest, RoutePriorityAnalysis};
use crate::services::PrioritizeOptions;
use crate::AppState;
use axum::{extract::State, Json};
use std::sync::Arc;

/// POST /routes/prioritize
/// Score an already-routed geometry segment by segment.
pub async fn prioritize_route(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PrioritizeRouteRequest>,
) -> Result<Json<RoutePriorityAnalysis>> {
    request.validate().map_err(AppError::InvalidRequest)?;

    let current_time = request
        .hour
        .map(|hour| state.road_priority.local_time_at_hour(hour))
        .transpose()?;

    let options = PrioritizeOptions {
        transport_mode: request.mode,
        current_time,
        weather: request.weather,
        factors: request.factors,
    };

    let analysis = state
        .road_priority
        .prioritize_route(&request.route, &options)
        .await?;

    Ok(Json(analysis))
}
