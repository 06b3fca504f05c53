use crate::cache::{direct_route_cache_key, RouteCache};
use crate::constants::{
    CARDINAL_DETOUR_OFFSET_DEG, DEFAULT_DETOUR_MIN_DIFFERENCE, DIAGONAL_DETOUR_OFFSET_DEG,
};
use crate::error::{AppError, Result};
use crate::models::{
    CandidateRoute, DetourDirection, RouteGeometry, RouteKind, RouteProfile, RoutePoint,
    TransportMode,
};
use crate::services::osrm::RouteProvider;
use futures::future::join_all;
use std::iter;
use std::sync::Arc;

/// Builds the candidate set a route is chosen from.
#[derive(Clone)]
pub struct AlternativeRouteGenerator {
    router: Arc<dyn RouteProvider>,
    cache: Option<Arc<dyn RouteCache>>,
    detour_min_difference: f64,
}

impl AlternativeRouteGenerator {
    pub fn new(router: Arc<dyn RouteProvider>) -> Self {
        AlternativeRouteGenerator {
            router,
            cache: None,
            detour_min_difference: DEFAULT_DETOUR_MIN_DIFFERENCE,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn RouteCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Relative distance change a detour needs over the direct route to be
    /// kept (0.1 = more than 10%).
    pub fn with_detour_min_difference(mut self, min_difference: f64) -> Self {
        self.detour_min_difference = min_difference;
        self
    }

    pub fn cache(&self) -> Option<&Arc<dyn RouteCache>> {
        self.cache.as_ref()
    }

    /// With waypoints: the route through them in order, plus the reversed
    /// order when there is more than one. Without: the direct route and up
    /// to `max_alternatives - 1` detours through an offset midpoint.
    ///
    /// Individual router failures only drop that candidate. When nothing
    /// could be built the error is `ServiceUnavailable` if every failure was
    /// retryable and `NoRouteFound` otherwise.
    pub async fn generate(
        &self,
        from: RoutePoint,
        to: RoutePoint,
        transport_mode: TransportMode,
        max_alternatives: usize,
        waypoints: &[RoutePoint],
    ) -> Result<Vec<CandidateRoute>> {
        let profile = transport_mode.profile();

        let (candidates, failures) = if waypoints.is_empty() {
            self.direct_and_detours(from, to, profile, max_alternatives)
                .await
        } else {
            self.through_waypoints(from, to, profile, waypoints).await
        };

        tracing::info!(
            candidates = candidates.len(),
            failures = failures.len(),
            mode = %transport_mode,
            waypoints = waypoints.len(),
            "Generated {} candidate routes",
            candidates.len()
        );

        if candidates.is_empty() {
            return Err(no_candidates_error(&from, &to, &failures));
        }

        Ok(candidates)
    }

    async fn through_waypoints(
        &self,
        from: RoutePoint,
        to: RoutePoint,
        profile: RouteProfile,
        waypoints: &[RoutePoint],
    ) -> (Vec<CandidateRoute>, Vec<AppError>) {
        let mut orders = vec![(RouteKind::Waypoint, waypoints.to_vec())];
        if waypoints.len() > 1 {
            orders.push((
                RouteKind::WaypointReversed,
                waypoints.iter().rev().copied().collect(),
            ));
        }

        let results = join_all(orders.iter().map(|(_, via)| {
            let points: Vec<RoutePoint> = iter::once(from)
                .chain(via.iter().copied())
                .chain(iter::once(to))
                .collect();
            async move { self.router.route(&points, profile).await }
        }))
        .await;

        let mut candidates = Vec::with_capacity(orders.len());
        let mut failures = Vec::new();
        for ((kind, via), result) in orders.into_iter().zip(results) {
            match result {
                Ok(geometry) => candidates.push(CandidateRoute::new(kind, geometry, from, to, via)),
                Err(e) => {
                    tracing::warn!(kind = %kind, "Failed to build {} route: {}", kind, e);
                    failures.push(e);
                }
            }
        }

        (candidates, failures)
    }

    async fn direct_and_detours(
        &self,
        from: RoutePoint,
        to: RoutePoint,
        profile: RouteProfile,
        max_alternatives: usize,
    ) -> (Vec<CandidateRoute>, Vec<AppError>) {
        let detour_count = max_alternatives
            .saturating_sub(1)
            .min(DetourDirection::ALL.len());
        let midpoint = from.midpoint(&to);

        let detours = DetourDirection::ALL[..detour_count].iter().map(|direction| {
            let (delta_lat, delta_lon) = detour_offset(*direction);
            let via = midpoint.offset(delta_lat, delta_lon);
            async move {
                let result = self.router.route(&[from, via, to], profile).await;
                (*direction, via, result)
            }
        });

        let (direct, detours) =
            futures::join!(self.direct_route(from, to, profile), join_all(detours));

        let mut candidates = Vec::with_capacity(detour_count + 1);
        let mut failures = Vec::new();
        let direct_distance = match direct {
            Ok(geometry) => {
                let distance = geometry.distance_meters;
                candidates.push(CandidateRoute::new(
                    RouteKind::Direct,
                    geometry,
                    from,
                    to,
                    Vec::new(),
                ));
                Some(distance)
            }
            Err(e) => {
                tracing::warn!("Failed to build direct route: {}", e);
                failures.push(e);
                None
            }
        };

        for (direction, via, result) in detours {
            let kind = RouteKind::Detour(direction);
            let geometry = match result {
                Ok(geometry) => geometry,
                Err(e) => {
                    tracing::warn!(kind = %kind, "Failed to build {} route: {}", kind, e);
                    failures.push(e);
                    continue;
                }
            };

            if let Some(direct_distance) = direct_distance {
                if !is_distinct_alternative(
                    direct_distance,
                    geometry.distance_meters,
                    self.detour_min_difference,
                ) {
                    tracing::debug!(
                        kind = %kind,
                        direct_m = direct_distance,
                        detour_m = geometry.distance_meters,
                        "Dropping {}: too close to the direct route",
                        kind
                    );
                    continue;
                }
            }

            candidates.push(CandidateRoute::new(kind, geometry, from, to, vec![via]));
        }

        (candidates, failures)
    }

    async fn direct_route(
        &self,
        from: RoutePoint,
        to: RoutePoint,
        profile: RouteProfile,
    ) -> Result<RouteGeometry> {
        let key = direct_route_cache_key(&from, &to, profile);

        if let Some(ref cache) = self.cache {
            if let Some(route) = cache.get_route(&key).await {
                return Ok(route);
            }
        }

        let route = self.router.route(&[from, to], profile).await?;

        if let Some(ref cache) = self.cache {
            cache.cache_route(&key, &route).await;
        }

        Ok(route)
    }
}

/// Error for a request that produced no candidate at all. Only an outage
/// (every router call failed with a retryable error) is reported as
/// `ServiceUnavailable`; anything else means there is no route to offer.
fn no_candidates_error(from: &RoutePoint, to: &RoutePoint, failures: &[AppError]) -> AppError {
    if !failures.is_empty() && failures.iter().all(AppError::is_retryable) {
        return AppError::ServiceUnavailable(format!(
            "router unavailable for all {} candidate requests: {}",
            failures.len(),
            failures[0]
        ));
    }

    AppError::NoRouteFound(format!(
        "no candidate route between ({:.5}, {:.5}) and ({:.5}, {:.5})",
        from.lat, from.lon, to.lat, to.lon
    ))
}

/// Latitude/longitude shift applied to the midpoint for each detour.
pub fn detour_offset(direction: DetourDirection) -> (f64, f64) {
    match direction {
        DetourDirection::North => (CARDINAL_DETOUR_OFFSET_DEG, 0.0),
        DetourDirection::South => (-CARDINAL_DETOUR_OFFSET_DEG, 0.0),
        DetourDirection::East => (0.0, CARDINAL_DETOUR_OFFSET_DEG),
        DetourDirection::West => (0.0, -CARDINAL_DETOUR_OFFSET_DEG),
        DetourDirection::Northeast => (DIAGONAL_DETOUR_OFFSET_DEG, DIAGONAL_DETOUR_OFFSET_DEG),
        DetourDirection::Southwest => (-DIAGONAL_DETOUR_OFFSET_DEG, -DIAGONAL_DETOUR_OFFSET_DEG),
    }
}

/// A detour counts as an alternative only if its length differs from the
/// direct route by strictly more than `min_difference` (relative).
pub fn is_distinct_alternative(direct_meters: f64, detour_meters: f64, min_difference: f64) -> bool {
    (detour_meters - direct_meters).abs() > direct_meters * min_difference
}
