use crate::models::coordinates::RoutePoint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One geocoder hit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeocodedPlace {
    pub point: RoutePoint,
    pub display_name: String,
    /// Structured address parts (road, house_number, city, ...)
    #[serde(default)]
    pub address: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct GeocodeResponse {
    pub results: Vec<GeocodedPlace>,
}
