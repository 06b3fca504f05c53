use async_trait::async_trait;
use citystep::cache::MemoryCacheService;
use citystep::models::{
    BoundingBox, GeocodedPlace, RouteGeometry, RouteProfile, RoutePoint, RoutingConfig,
};
use citystep::services::{
    AttributeProvider, Geocoder, IntelligentRouter, RoadPriorityService, RouteProvider,
    SegmentProviders, SessionRegistry,
};
use citystep::{AppError, AppState, Result};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Kremlin area, the walk used throughout the integration tests
#[allow(dead_code)]
pub fn kremlin() -> RoutePoint {
    RoutePoint::new(55.7539, 37.6208).unwrap()
}

/// Gorky Park entrance
#[allow(dead_code)]
pub fn gorky_park() -> RoutePoint {
    RoutePoint::new(55.7298, 37.6019).unwrap()
}

/// Straight polyline through `points` with the given length.
#[allow(dead_code)]
pub fn geometry(points: Vec<RoutePoint>, distance_meters: f64) -> RouteGeometry {
    RouteGeometry {
        points,
        distance_meters,
        duration_seconds: distance_meters / 1.4,
    }
}

/// Route provider that echoes the requested points back as the geometry.
/// Two-point requests are the direct route; anything longer is a detour or
/// waypoint route.
#[allow(dead_code)]
pub struct MockRouter {
    pub direct_meters: f64,
    pub detour_meters: f64,
    pub fail_direct: bool,
    pub fail_all: bool,
    pub no_route: bool,
    pub delay: Option<Duration>,
    calls: AtomicUsize,
    direct_calls: AtomicUsize,
}

#[allow(dead_code)]
impl MockRouter {
    pub fn new(direct_meters: f64, detour_meters: f64) -> Self {
        MockRouter {
            direct_meters,
            detour_meters,
            fail_direct: false,
            fail_all: false,
            no_route: false,
            delay: None,
            calls: AtomicUsize::new(0),
            direct_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_direct(mut self) -> Self {
        self.fail_direct = true;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_all = true;
        self
    }

    /// Every request answers like OSRM's `NoRoute` code.
    pub fn reporting_no_route(mut self) -> Self {
        self.no_route = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn direct_calls(&self) -> usize {
        self.direct_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RouteProvider for MockRouter {
    async fn route(&self, points: &[RoutePoint], _profile: RouteProfile) -> Result<RouteGeometry> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let is_direct = points.len() == 2;
        if is_direct {
            self.direct_calls.fetch_add(1, Ordering::SeqCst);
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.no_route {
            return Err(AppError::RouteNotFound("NoRoute".to_string()));
        }

        if self.fail_all || (is_direct && self.fail_direct) {
            return Err(AppError::ServiceUnavailable("mock router down".to_string()));
        }

        let distance = if is_direct {
            self.direct_meters
        } else {
            self.detour_meters
        };
        Ok(geometry(points.to_vec(), distance))
    }
}

/// Geocoder returning a fixed list of places for any non-empty query.
#[allow(dead_code)]
pub struct MockGeocoder {
    pub places: Vec<GeocodedPlace>,
}

#[allow(dead_code)]
impl MockGeocoder {
    pub fn with_places(count: usize) -> Self {
        let places = (0..count)
            .map(|i| GeocodedPlace {
                point: RoutePoint::new(55.75 + i as f64 * 0.001, 37.62).unwrap(),
                display_name: format!("Place {}, Moscow", i),
                address: BTreeMap::from([("city".to_string(), "Moscow".to_string())]),
            })
            .collect();
        MockGeocoder { places }
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn search(
        &self,
        query: &str,
        _bounds: Option<&BoundingBox>,
    ) -> Result<Vec<GeocodedPlace>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidRequest("Empty query".to_string()));
        }
        Ok(self.places.clone())
    }
}

/// Attribute provider that fails for segments starting at `fail_at` and
/// returns `value` everywhere else.
#[allow(dead_code)]
pub struct FailingAtProvider {
    pub fail_at: RoutePoint,
    pub value: f64,
}

#[async_trait]
impl AttributeProvider<f64> for FailingAtProvider {
    async fn lookup(&self, start: &RoutePoint, _end: &RoutePoint) -> Result<f64> {
        if *start == self.fail_at {
            return Err(AppError::ProviderUnavailable(
                "traffic feed timed out".to_string(),
            ));
        }
        Ok(self.value)
    }

    fn name(&self) -> &'static str {
        "failing-at"
    }
}

/// Priority service over fixed segment attributes.
#[allow(dead_code)]
pub fn fixed_priority_service() -> Arc<RoadPriorityService> {
    Arc::new(RoadPriorityService::new(
        SegmentProviders::fixed(citystep::models::RoadType::Residential, 0.3, 0.8, 0.9),
        RoutingConfig::default(),
    ))
}

/// Application state backed by mocks; nothing touches the network.
#[allow(dead_code)]
pub fn test_state(router: Arc<MockRouter>) -> Arc<AppState> {
    let road_priority = Arc::new(RoadPriorityService::new(
        SegmentProviders::demo(),
        RoutingConfig::default(),
    ));
    let cache = Arc::new(MemoryCacheService::new(3600, 100));
    let intelligent_router = Arc::new(
        IntelligentRouter::new(router, Arc::clone(&road_priority)).with_cache(cache.clone()),
    );

    Arc::new(AppState {
        road_priority,
        router: intelligent_router,
        geocoder: Arc::new(MockGeocoder::with_places(8)),
        sessions: SessionRegistry::new(),
        cache: Some(cache),
        default_max_alternatives: 3,
    })
}

/// Real OSRM/Nominatim/Overpass tests only run when explicitly enabled
#[allow(dead_code)]
pub fn should_skip_real_api_tests() -> bool {
    std::env::var("CITYSTEP_REAL_API_TESTS").is_err()
}
