use crate::constants::{DEFAULT_GEOCODER_LIMIT, MAX_GEOCODER_LIMIT};
use crate::error::Result;
use crate::models::{GeocodeQuery, GeocodeResponse};
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

/// GET /geocode?q=...&limit=...
pub async fn geocode(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GeocodeQuery>,
) -> Result<Json<GeocodeResponse>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_GEOCODER_LIMIT)
        .clamp(1, MAX_GEOCODER_LIMIT);

    let mut results = state.geocoder.search(&query.q, None).await?;
    results.truncate(limit);

    Ok(Json(GeocodeResponse { results }))
}
