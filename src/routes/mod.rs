pub mod config;
pub mod debug;
pub mod geocode;
pub mod optimized_route;
pub mod prioritize;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/routes/optimized", post(optimized_route::create_optimized_route))
        .route("/routes/prioritize", post(prioritize::prioritize_route))
        .route("/geocode", get(geocode::geocode))
        .route(
            "/config",
            get(config::get_config).patch(config::update_config),
        )
        .route("/config/reset", post(config::reset_config))
        .route("/config/presets/{kind}", post(config::apply_preset))
        .route("/presets", get(config::list_presets))
        .route("/debug/health", get(debug::health_check))
        .route("/debug/cache", delete(debug::clear_cache))
        .with_state(state)
}
