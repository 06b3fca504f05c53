use crate::constants::SESSION_HEADER;
use crate::error::{AppError, Result};
use crate::models::{OptimizedRoute, OptimizedRouteRequest};
use crate::services::RouteOptions;
use crate::AppState;
use axum::{extract::State, http::HeaderMap, Json};
use std::sync::Arc;

/// POST /routes/optimized
/// Build candidate routes between two points and return the best one.
/// Requests carrying the same `x-session-id` supersede each other.
pub async fn create_optimized_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<OptimizedRouteRequest>,
) -> Result<Json<OptimizedRoute>> {
    request.validate().map_err(AppError::InvalidRequest)?;

    let current_time = request
        .hour
        .map(|hour| state.road_priority.local_time_at_hour(hour))
        .transpose()?;

    let options = RouteOptions {
        transport_mode: request.mode,
        waypoints: request.waypoints,
        max_alternatives: request
            .max_alternatives
            .unwrap_or(state.default_max_alternatives),
        avoid_high_traffic: request.avoid_high_traffic,
        prefer_safe_routes: request.prefer_safe_routes,
        prefer_parks: request.prefer_parks,
        weather: request.weather,
        current_time,
    };

    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty());

    tracing::info!(
        from_lat = request.from.lat,
        from_lon = request.from.lon,
        to_lat = request.to.lat,
        to_lon = request.to.lon,
        mode = %options.transport_mode,
        waypoints = options.waypoints.len(),
        max_alternatives = options.max_alternatives,
        session = session_id.unwrap_or("-"),
        "Optimized route request: ({:.4}, {:.4}) -> ({:.4}, {:.4}), mode={}",
        request.from.lat,
        request.from.lon,
        request.to.lat,
        request.to.lon,
        options.transport_mode
    );

    let route = match session_id {
        Some(id) => {
            let session = state.sessions.session(id).await;
            session
                .build(&state.router, request.from, request.to, &options)
                .await?
        }
        None => {
            state
                .router
                .build_optimized_route(request.from, request.to, &options)
                .await?
        }
    };

    Ok(Json(route))
}
