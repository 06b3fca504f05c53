use crate::constants::{DEFAULT_OSRM_BASE_URL, OSRM_MAX_COORDINATES, UPSTREAM_REQUEST_TIMEOUT_SECONDS};
use crate::error::{AppError, Result};
use crate::models::{RouteGeometry, RoutePoint, RouteProfile};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Street-network router: returns the geometry, length and travel time of the
/// route through `points` in order.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn route(&self, points: &[RoutePoint], profile: RouteProfile) -> Result<RouteGeometry>;
}

#[derive(Clone)]
pub struct OsrmClient {
    client: Client,
    base_url: String,
}

impl OsrmClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_OSRM_BASE_URL.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        OsrmClient {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn route_url(&self, points: &[RoutePoint], profile: RouteProfile) -> String {
        // OSRM wants "lon,lat;lon,lat;..."
        let coordinates = points
            .iter()
            .map(|p| format!("{},{}", p.lon, p.lat))
            .collect::<Vec<_>>()
            .join(";");

        format!("{}/route/v1/{}/{}", self.base_url, profile, coordinates)
    }
}

impl Default for OsrmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RouteProvider for OsrmClient {
    async fn route(&self, points: &[RoutePoint], profile: RouteProfile) -> Result<RouteGeometry> {
        if points.len() < 2 {
            return Err(AppError::InvalidRoute(
                "At least 2 points required".to_string(),
            ));
        }

        if points.len() > OSRM_MAX_COORDINATES {
            return Err(AppError::InvalidRequest(format!(
                "Maximum {} points allowed",
                OSRM_MAX_COORDINATES
            )));
        }

        let url = self.route_url(points, profile);

        tracing::debug!(
            points = points.len(),
            profile = %profile,
            "OSRM request: {} points, profile {}",
            points.len(),
            profile
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("overview", "full"),
                ("geometries", "geojson"),
                ("steps", "false"),
                ("alternatives", "false"),
            ])
            .timeout(Duration::from_secs(UPSTREAM_REQUEST_TIMEOUT_SECONDS))
            .send()
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("OSRM request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("OSRM body read failed: {}", e)))?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                points = points.len(),
                "OSRM HTTP error {}",
                status
            );
        }

        let route = parse_route_response(status.is_success(), &body)?;

        tracing::debug!(
            distance_km = %format!("{:.2}", route.distance_km()),
            duration_min = route.duration_minutes(),
            path_points = route.points.len(),
            "OSRM response: {:.2}km, {}min, {} path points",
            route.distance_km(),
            route.duration_minutes(),
            route.points.len()
        );

        Ok(route)
    }
}

/// Turn an OSRM `/route` body into our geometry. OSRM reports "no route"
/// both as HTTP 400 with a code and as HTTP 200 with an empty route list.
fn parse_route_response(http_ok: bool, body: &str) -> Result<RouteGeometry> {
    let parsed: std::result::Result<OsrmRouteResponse, _> = serde_json::from_str(body);

    let response = match parsed {
        Ok(response) => response,
        Err(e) if http_ok => {
            return Err(AppError::ServiceUnavailable(format!(
                "Failed to parse OSRM response: {}",
                e
            )))
        }
        Err(_) => {
            return Err(AppError::ServiceUnavailable(format!(
                "OSRM HTTP error: {}",
                body.chars().take(200).collect::<String>()
            )))
        }
    };

    match response.code.as_str() {
        "Ok" => {}
        "NoRoute" | "NoSegment" => {
            return Err(AppError::RouteNotFound(
                response.message.unwrap_or(response.code),
            ))
        }
        "InvalidQuery" | "InvalidValue" | "InvalidUrl" | "TooBig" => {
            return Err(AppError::InvalidRequest(
                response.message.unwrap_or(response.code),
            ))
        }
        other => {
            return Err(AppError::ServiceUnavailable(format!(
                "OSRM returned {}: {}",
                other,
                response.message.unwrap_or_default()
            )))
        }
    }

    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| AppError::RouteNotFound("OSRM returned no routes".to_string()))?;

    let points: Vec<RoutePoint> = route
        .geometry
        .coordinates
        .iter()
        .filter_map(|coord| RoutePoint::new(coord[1], coord[0]).ok())
        .collect();

    if points.len() < 2 {
        return Err(AppError::RouteNotFound(format!(
            "OSRM route geometry has {} usable points",
            points.len()
        )));
    }

    Ok(RouteGeometry {
        points,
        distance_meters: route.distance,
        duration_seconds: route.duration,
    })
}

// OSRM API response types

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64, // meters
    duration: f64, // seconds
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>, // [lon, lat] pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK_BODY: &str = r#"{
        "code": "Ok",
        "routes": [{
            "distance": 3120.4,
            "duration": 2246.9,
            "geometry": {
                "type": "LineString",
                "coordinates": [[37.6208, 55.7539], [37.6150, 55.7450], [37.6019, 55.7298]]
            }
        }],
        "waypoints": []
    }"#;

    #[test]
    fn test_parse_ok_response_swaps_lon_lat() {
        let route = parse_route_response(true, OK_BODY).unwrap();

        assert_eq!(route.points.len(), 3);
        assert_eq!(route.points[0].lat, 55.7539);
        assert_eq!(route.points[0].lon, 37.6208);
        assert_eq!(route.distance_meters, 3120.4);
        assert_eq!(route.duration_seconds, 2246.9);
    }

    #[test]
    fn test_parse_no_route_code() {
        let body = r#"{"code": "NoRoute", "message": "Impossible route between points"}"#;
        let err = parse_route_response(false, body).unwrap_err();
        assert!(matches!(err, AppError::RouteNotFound(_)));

        let body = r#"{"code": "NoSegment", "message": "Could not find a matching segment"}"#;
        let err = parse_route_response(false, body).unwrap_err();
        assert!(matches!(err, AppError::RouteNotFound(_)));
    }

    #[test]
    fn test_parse_empty_routes_is_not_found() {
        let body = r#"{"code": "Ok", "routes": []}"#;
        let err = parse_route_response(true, body).unwrap_err();
        assert!(matches!(err, AppError::RouteNotFound(_)));
    }

    #[test]
    fn test_parse_garbage_is_service_unavailable() {
        let err = parse_route_response(false, "<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
        assert!(err.is_retryable());

        let err = parse_route_response(true, "not json").unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
    }

    #[test]
    fn test_route_url_format() {
        let client = OsrmClient::with_base_url("http://localhost:5000/".to_string());
        let points = vec![
            RoutePoint::new(55.7539, 37.6208).unwrap(),
            RoutePoint::new(55.7298, 37.6019).unwrap(),
        ];

        assert_eq!(
            client.route_url(&points, RouteProfile::Foot),
            "http://localhost:5000/route/v1/foot/37.6208,55.7539;37.6019,55.7298"
        );
    }

    #[tokio::test]
    async fn test_rejects_single_point() {
        let client = OsrmClient::new();
        let points = vec![RoutePoint::new(55.7539, 37.6208).unwrap()];

        let err = client.route(&points, RouteProfile::Foot).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRoute(_)));
    }

    #[tokio::test]
    async fn test_rejects_too_many_points() {
        let client = OsrmClient::new();
        let points = vec![RoutePoint::new(55.7539, 37.6208).unwrap(); OSRM_MAX_COORDINATES + 1];

        let err = client.route(&points, RouteProfile::Foot).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }
}
