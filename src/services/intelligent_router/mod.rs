pub mod alternatives;
pub mod selector;
pub mod session;

pub use alternatives::AlternativeRouteGenerator;
pub use selector::{RouteSelector, ScoredCandidate, Selection};
pub use session::{RouteSession, SessionRegistry};

use crate::cache::RouteCache;
use crate::constants::DEFAULT_MAX_ALTERNATIVES;
use crate::error::Result;
use crate::models::{
    AlternativeRouteSummary, OptimizedRoute, RouteObjective, RoutePoint, RouteSummaryText,
    TransportMode, Weather,
};
use crate::services::osrm::RouteProvider;
use crate::services::road_priority::{PrioritizeOptions, RoadPriorityService};
use std::sync::Arc;
use time::OffsetDateTime;

/// Options for [`IntelligentRouter::build_optimized_route`]. Objective flags
/// left unset follow the current routing config.
#[derive(Debug, Clone)]
pub struct RouteOptions {
    pub transport_mode: TransportMode,
    pub waypoints: Vec<RoutePoint>,
    pub max_alternatives: usize,
    pub avoid_high_traffic: Option<bool>,
    pub prefer_safe_routes: Option<bool>,
    pub prefer_parks: Option<bool>,
    pub weather: Option<Weather>,
    pub current_time: Option<OffsetDateTime>,
}

impl Default for RouteOptions {
    fn default() -> Self {
        RouteOptions {
            transport_mode: TransportMode::Walking,
            waypoints: Vec::new(),
            max_alternatives: DEFAULT_MAX_ALTERNATIVES,
            avoid_high_traffic: None,
            prefer_safe_routes: None,
            prefer_parks: None,
            weather: None,
            current_time: None,
        }
    }
}

/// Generate candidates, rank them, and return the best with its analysis.
pub struct IntelligentRouter {
    prioritizer: Arc<RoadPriorityService>,
    generator: AlternativeRouteGenerator,
    selector: RouteSelector,
}

impl IntelligentRouter {
    pub fn new(router: Arc<dyn RouteProvider>, prioritizer: Arc<RoadPriorityService>) -> Self {
        IntelligentRouter {
            generator: AlternativeRouteGenerator::new(router),
            selector: RouteSelector::new(Arc::clone(&prioritizer)),
            prioritizer,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn RouteCache>) -> Self {
        self.generator = self.generator.with_cache(cache);
        self
    }

    pub fn with_detour_min_difference(mut self, min_difference: f64) -> Self {
        self.generator = self.generator.with_detour_min_difference(min_difference);
        self
    }

    pub fn prioritizer(&self) -> &Arc<RoadPriorityService> {
        &self.prioritizer
    }

    pub fn generator(&self) -> &AlternativeRouteGenerator {
        &self.generator
    }

    pub async fn build_optimized_route(
        &self,
        from: RoutePoint,
        to: RoutePoint,
        options: &RouteOptions,
    ) -> Result<OptimizedRoute> {
        let config = self.prioritizer.config();

        let objective = RouteObjective {
            avoid_high_traffic: options
                .avoid_high_traffic
                .unwrap_or(config.avoid_high_traffic),
            prefer_safe_routes: options
                .prefer_safe_routes
                .unwrap_or(config.prefer_safe_routes),
            prefer_parks: options.prefer_parks.unwrap_or(config.prefer_parks),
        };
        let prioritize_options = PrioritizeOptions {
            transport_mode: options.transport_mode,
            current_time: options.current_time,
            weather: options.weather,
            factors: None,
        };

        let candidates = self
            .generator
            .generate(
                from,
                to,
                options.transport_mode,
                options.max_alternatives,
                &options.waypoints,
            )
            .await?;

        let selection = self
            .selector
            .select(candidates, &prioritize_options, &objective, &config)
            .await?;

        let alternative_routes = selection
            .ranked
            .into_iter()
            .map(|candidate| AlternativeRouteSummary {
                summary: RouteSummaryText::for_geometry(&candidate.route.geometry),
                route_priority: candidate
                    .analysis
                    .as_ref()
                    .map(|a| a.route_priority)
                    .unwrap_or(0.0),
                score: candidate.route.score.unwrap_or(0.0),
                route: candidate.route,
            })
            .collect::<Vec<_>>();

        let winner = selection.winner;

        tracing::info!(
            kind = %winner.route.kind,
            score = ?winner.route.score,
            distance_m = winner.route.geometry.distance_meters,
            alternatives = alternative_routes.len(),
            "Selected {} route ({} alternatives)",
            winner.route.kind,
            alternative_routes.len()
        );

        Ok(OptimizedRoute {
            summary: RouteSummaryText::for_geometry(&winner.route.geometry),
            route: winner.route,
            priority_analysis: winner.analysis,
            alternative_routes,
        })
    }
}
