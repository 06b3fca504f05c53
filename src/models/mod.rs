pub mod coordinates;
pub mod format;
pub mod geocode;
pub mod priority;
pub mod route;
pub mod segment;

pub use coordinates::{BoundingBox, RoutePoint};
pub use geocode::{GeocodeQuery, GeocodeResponse, GeocodedPlace};
pub use priority::{
    AlternativePreset, Factor, FactorWeights, PresetKind, Recommendation, RecommendationKind,
    RoadTypeProfile, RoutePriorityAnalysis, RoutingConfig, RoutingConfigUpdate, TimeOfDay,
    Weather,
};
pub use route::{
    AlternativeRouteSummary, CandidateRoute, DetourDirection, OptimizedRoute,
    OptimizedRouteRequest, PrioritizeRouteRequest, RouteGeometry, RouteKind, RouteObjective,
    RouteProfile, RouteSummaryText, TransportMode,
};
pub use segment::{RoadSegment, RoadType, ScoredSegment, SubScores};
