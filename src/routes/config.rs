use crate::error::{AppError, Result};
use crate::models::{AlternativePreset, PresetKind, RoutingConfig, RoutingConfigUpdate};
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

/// GET /config
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<RoutingConfig> {
    Json(state.road_priority.config().as_ref().clone())
}

/// PATCH /config
/// Shallow-merge the given fields; factor weights are renormalised.
pub async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(update): Json<RoutingConfigUpdate>,
) -> Result<Json<RoutingConfig>> {
    let config = state.road_priority.update_config(&update)?;
    Ok(Json(config.as_ref().clone()))
}

/// POST /config/reset
pub async fn reset_config(State(state): State<Arc<AppState>>) -> Json<RoutingConfig> {
    Json(state.road_priority.reset_to_defaults().as_ref().clone())
}

/// POST /config/presets/{kind}
pub async fn apply_preset(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<Json<RoutingConfig>> {
    let kind: PresetKind = kind.parse().map_err(AppError::InvalidRequest)?;
    let config = state.road_priority.apply_preset(kind)?;
    Ok(Json(config.as_ref().clone()))
}

/// GET /presets
pub async fn list_presets(State(state): State<Arc<AppState>>) -> Json<Vec<AlternativePreset>> {
    Json(state.road_priority.list_alternative_presets())
}
