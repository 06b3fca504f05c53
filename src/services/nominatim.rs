use crate::constants::{
    DEFAULT_GEOCODER_LIMIT, DEFAULT_NOMINATIM_BASE_URL, DEFAULT_NOMINATIM_USER_AGENT,
    UPSTREAM_REQUEST_TIMEOUT_SECONDS,
};
use crate::error::{AppError, Result};
use crate::models::{BoundingBox, GeocodedPlace, RoutePoint};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Free-text place search.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Places matching `query`, best first. `bounds` overrides the client's
    /// default search window. No match is an empty list, not an error.
    async fn search(&self, query: &str, bounds: Option<&BoundingBox>)
        -> Result<Vec<GeocodedPlace>>;
}

/// Geocoder settings, usually built by `Config::from_env`.
#[derive(Debug, Clone)]
pub struct NominatimSettings {
    pub base_url: String,
    /// Nominatim's usage policy rejects requests without one
    pub user_agent: String,
    pub limit: usize,
    pub default_bounds: Option<BoundingBox>,
    /// ISO 3166-1 alpha-2 codes, comma separated
    pub country_codes: Option<String>,
    /// Appended to every query, e.g. ", Moscow, Russia"
    pub query_suffix: Option<String>,
}

impl Default for NominatimSettings {
    fn default() -> Self {
        NominatimSettings {
            base_url: DEFAULT_NOMINATIM_BASE_URL.to_string(),
            user_agent: DEFAULT_NOMINATIM_USER_AGENT.to_string(),
            limit: DEFAULT_GEOCODER_LIMIT,
            default_bounds: None,
            country_codes: None,
            query_suffix: None,
        }
    }
}

#[derive(Clone)]
pub struct NominatimClient {
    client: Client,
    settings: NominatimSettings,
}

impl NominatimClient {
    pub fn new(settings: NominatimSettings) -> Self {
        NominatimClient {
            client: Client::new(),
            settings,
        }
    }

    /// Query parameters for one search, in the order they are sent.
    fn search_params(&self, query: &str, bounds: Option<&BoundingBox>) -> Vec<(&'static str, String)> {
        let q = match self.settings.query_suffix {
            Some(ref suffix) if !suffix.is_empty() => format!("{}{}", query, suffix),
            _ => query.to_string(),
        };

        let mut params = vec![
            ("format", "json".to_string()),
            ("q", q),
            ("limit", self.settings.limit.to_string()),
            ("addressdetails", "1".to_string()),
        ];

        if let Some(bounds) = bounds.or(self.settings.default_bounds.as_ref()) {
            params.push(("viewbox", bounds.to_viewbox()));
            params.push(("bounded", "1".to_string()));
        }

        if let Some(ref codes) = self.settings.country_codes {
            params.push(("countrycodes", codes.clone()));
        }

        params
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn search(
        &self,
        query: &str,
        bounds: Option<&BoundingBox>,
    ) -> Result<Vec<GeocodedPlace>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidRequest(
                "Search query must not be empty".to_string(),
            ));
        }

        let url = format!("{}/search", self.settings.base_url.trim_end_matches('/'));
        let params = self.search_params(query, bounds);

        tracing::debug!(query = %query, "Nominatim search: {}", query);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.settings.user_agent)
            .query(&params)
            .timeout(Duration::from_secs(UPSTREAM_REQUEST_TIMEOUT_SECONDS))
            .send()
            .await
            .map_err(|e| {
                AppError::ServiceUnavailable(format!("Nominatim request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(status = %status, "Nominatim HTTP error {}", status);
            return Err(AppError::ServiceUnavailable(format!(
                "Nominatim HTTP {}",
                status
            )));
        }

        let body: Value = response.json().await.map_err(|e| {
            AppError::ServiceUnavailable(format!("Failed to parse Nominatim response: {}", e))
        })?;

        let places = parse_places(&body);
        tracing::debug!(
            query = %query,
            results = places.len(),
            "Nominatim returned {} places",
            places.len()
        );

        Ok(places)
    }
}

/// Nominatim returns coordinates as strings; entries that do not parse are
/// skipped rather than failing the whole search.
fn parse_places(body: &Value) -> Vec<GeocodedPlace> {
    let Some(entries) = body.as_array() else {
        tracing::debug!("Nominatim response is not an array");
        return Vec::new();
    };

    entries.iter().filter_map(parse_place).collect()
}

fn parse_place(entry: &Value) -> Option<GeocodedPlace> {
    let coordinate = |key: &str| -> Option<f64> {
        match entry.get(key)? {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    };

    let point = match (coordinate("lat"), coordinate("lon")) {
        (Some(lat), Some(lon)) => RoutePoint::new(lat, lon).ok(),
        _ => None,
    };
    let display_name = entry.get("display_name").and_then(Value::as_str);

    let (Some(point), Some(display_name)) = (point, display_name) else {
        tracing::debug!("Skipping malformed Nominatim entry: {}", entry);
        return None;
    };

    let address = entry
        .get("address")
        .and_then(Value::as_object)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect::<BTreeMap<_, _>>()
        })
        .unwrap_or_default();

    Some(GeocodedPlace {
        point,
        display_name: display_name.to_string(),
        address,
    })
}
