use crate::constants::*;
use crate::error::{AppError, Result};
use crate::models::{RoadType, RoutePoint};
use crate::services::providers::AttributeProvider;
use async_trait::async_trait;
use moka::future::Cache;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Primary Overpass API endpoints with automatic fallback
const OVERPASS_ENDPOINTS: &[&str] = &[
    "https://overpass-api.de/api/interpreter", // Official main endpoint
    "https://overpass.private.coffee/api/interpreter", // Community mirror
    "https://maps.mail.ru/osm/tools/overpass/api/interpreter", // Mail.ru mirror
];

/// Road type from the OSM `highway` ways around the segment midpoint.
#[derive(Clone)]
pub struct OverpassRoadTypeProvider {
    client: Client,
    endpoints: Vec<String>,
    current_endpoint_idx: Arc<AtomicUsize>,
    radius_meters: u32,
    /// Keyed by the midpoint rounded to ~10 m
    cache: Cache<(i64, i64), RoadType>,
}

impl OverpassRoadTypeProvider {
    pub fn new() -> Self {
        Self::with_endpoints(OVERPASS_ENDPOINTS.iter().map(|s| s.to_string()).collect())
    }

    pub fn with_endpoints(endpoints: Vec<String>) -> Self {
        OverpassRoadTypeProvider {
            client: Client::new(),
            endpoints,
            current_endpoint_idx: Arc::new(AtomicUsize::new(0)),
            radius_meters: OVERPASS_HIGHWAY_SEARCH_RADIUS_M,
            cache: Cache::builder()
                .max_capacity(ROAD_TYPE_CACHE_MAX_ENTRIES)
                .build(),
        }
    }

    /// Get the next endpoint to try (round-robin)
    fn get_next_endpoint(&self) -> Option<&str> {
        if self.endpoints.is_empty() {
            return None;
        }
        let idx = self.current_endpoint_idx.fetch_add(1, Ordering::Relaxed);
        Some(&self.endpoints[idx % self.endpoints.len()])
    }

    fn cache_key(point: &RoutePoint) -> (i64, i64) {
        let scale = 10f64.powi(ROAD_TYPE_CACHE_DECIMALS as i32);
        (
            (point.lat * scale).round() as i64,
            (point.lon * scale).round() as i64,
        )
    }

    fn build_query(&self, center: &RoutePoint) -> String {
        format!(
            "[out:json][timeout:{}];way(around:{},{},{})[highway];out tags;",
            OVERPASS_QUERY_TIMEOUT_SECONDS, self.radius_meters, center.lat, center.lon
        )
    }

    /// Execute query with retry on timeouts and rate limiting.
    /// `max_retries` = 2 means 3 total attempts.
    async fn execute_query_with_retry(
        &self,
        query: &str,
        max_retries: usize,
    ) -> Result<Vec<OverpassElement>> {
        let mut retry_count = 0;

        loop {
            let endpoint = self.get_next_endpoint().ok_or_else(|| {
                AppError::ProviderUnavailable("No Overpass endpoints configured".to_string())
            })?;

            let response_result = self
                .client
                .post(endpoint)
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(format!("data={}", urlencoding::encode(query)))
                .timeout(Duration::from_secs(OVERPASS_QUERY_TIMEOUT_SECONDS))
                .send()
                .await;

            let response = match response_result {
                Ok(resp) => resp,
                Err(e) => {
                    let error_msg = if e.is_timeout() {
                        "Request timed out".to_string()
                    } else {
                        format!("Request failed: {}", e)
                    };

                    if retry_count < max_retries {
                        retry_count += 1;
                        let backoff_ms = 1000 * (2_u64.pow(retry_count as u32));

                        tracing::warn!(
                            "Overpass highway query {} ({}), retrying in {}ms (attempt {}/{})",
                            error_msg,
                            endpoint,
                            backoff_ms,
                            retry_count + 1,
                            max_retries + 1
                        );

                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                        continue;
                    }

                    return Err(AppError::ProviderUnavailable(format!(
                        "Overpass {} after {} attempts",
                        error_msg,
                        max_retries + 1
                    )));
                }
            };

            let status = response.status();

            if status.is_success() {
                let api_response: OverpassResponse = response.json().await.map_err(|e| {
                    AppError::ProviderUnavailable(format!(
                        "Failed to parse Overpass response: {}",
                        e
                    ))
                })?;

                return Ok(api_response.elements);
            }

            let is_retryable = status == OVERPASS_HTTP_TOO_MANY_REQUESTS
                || status == OVERPASS_HTTP_GATEWAY_TIMEOUT;

            if is_retryable && retry_count < max_retries {
                retry_count += 1;
                let backoff_ms = 1000 * (2_u64.pow(retry_count as u32));

                tracing::warn!(
                    "Overpass returned HTTP {}, retrying in {}ms (attempt {}/{})",
                    status,
                    backoff_ms,
                    retry_count + 1,
                    max_retries + 1
                );

                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                continue;
            }

            return Err(AppError::ProviderUnavailable(format!(
                "Overpass HTTP {}",
                status
            )));
        }
    }
}

impl Default for OverpassRoadTypeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AttributeProvider<RoadType> for OverpassRoadTypeProvider {
    async fn lookup(&self, start: &RoutePoint, end: &RoutePoint) -> Result<RoadType> {
        let center = start.midpoint(end);
        let key = Self::cache_key(&center);

        if let Some(road_type) = self.cache.get(&key).await {
            return Ok(road_type);
        }

        let query = self.build_query(&center);
        let elements = self
            .execute_query_with_retry(&query, OVERPASS_RETRY_MAX_ATTEMPTS)
            .await?;

        let road_type = dominant_road_type(&elements).unwrap_or_else(|| {
            tracing::debug!(
                lat = center.lat,
                lon = center.lon,
                "No highway within {}m, assuming {}",
                self.radius_meters,
                RoadType::DEFAULT
            );
            RoadType::DEFAULT
        });

        self.cache.insert(key, road_type).await;
        Ok(road_type)
    }

    fn name(&self) -> &'static str {
        "overpass"
    }
}

/// Most frequent road type among the returned ways. Ties go to the more
/// walkable type.
fn dominant_road_type(elements: &[OverpassElement]) -> Option<RoadType> {
    let mut counts: BTreeMap<RoadType, usize> = BTreeMap::new();
    for highway in elements.iter().filter_map(|e| e.tags.get("highway")) {
        *counts.entry(RoadType::from_osm_tag(highway)).or_default() += 1;
    }

    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(road_type, _)| road_type)
}

// Overpass API response types

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(default)]
    tags: HashMap<String, String>,
}
