use crate::constants::{MAX_ALTERNATIVES_CLAMP, OSRM_MAX_COORDINATES};
use crate::models::coordinates::RoutePoint;
use crate::models::priority::{FactorWeights, RoutePriorityAnalysis, Weather};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    #[default]
    Walking,
    Cycling,
    Driving,
    Taxi,
    PublicTransport,
}

impl TransportMode {
    /// OSRM profile used to route this mode. Modes without a dedicated
    /// profile route like cars.
    pub fn profile(&self) -> RouteProfile {
        match self {
            TransportMode::Walking => RouteProfile::Foot,
            TransportMode::Cycling => RouteProfile::Bicycle,
            TransportMode::Driving | TransportMode::Taxi | TransportMode::PublicTransport => {
                RouteProfile::Driving
            }
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Walking => write!(f, "walking"),
            TransportMode::Cycling => write!(f, "cycling"),
            TransportMode::Driving => write!(f, "driving"),
            TransportMode::Taxi => write!(f, "taxi"),
            TransportMode::PublicTransport => write!(f, "public_transport"),
        }
    }
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "walk" | "walking" | "foot" => Ok(TransportMode::Walking),
            "bike" | "cycling" | "bicycle" => Ok(TransportMode::Cycling),
            "driving" | "car" => Ok(TransportMode::Driving),
            "taxi" => Ok(TransportMode::Taxi),
            "public_transport" | "transit" => Ok(TransportMode::PublicTransport),
            _ => Err(format!("Invalid transport mode: '{}'", s)),
        }
    }
}

/// Routing engine mode selector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RouteProfile {
    Foot,
    Bicycle,
    Driving,
}

impl RouteProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteProfile::Foot => "foot",
            RouteProfile::Bicycle => "bicycle",
            RouteProfile::Driving => "driving",
        }
    }
}

impl fmt::Display for RouteProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A routed polyline as returned by the router.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteGeometry {
    pub points: Vec<RoutePoint>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

impl RouteGeometry {
    pub fn distance_km(&self) -> f64 {
        self.distance_meters / 1000.0
    }

    pub fn duration_minutes(&self) -> u32 {
        (self.duration_seconds / 60.0).round() as u32
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.points.len() < 2 {
            return Err(format!(
                "Route geometry needs at least 2 points, got {}",
                self.points.len()
            ));
        }
        if !self.distance_meters.is_finite() || self.distance_meters < 0.0 {
            return Err("Route distance must be a non-negative number".to_string());
        }
        self.points.iter().try_for_each(RoutePoint::validate)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DetourDirection {
    North,
    South,
    East,
    West,
    Northeast,
    Southwest,
}

impl DetourDirection {
    /// Strategy order used when generating detours.
    pub const ALL: [DetourDirection; 6] = [
        DetourDirection::North,
        DetourDirection::South,
        DetourDirection::East,
        DetourDirection::West,
        DetourDirection::Northeast,
        DetourDirection::Southwest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetourDirection::North => "north",
            DetourDirection::South => "south",
            DetourDirection::East => "east",
            DetourDirection::West => "west",
            DetourDirection::Northeast => "northeast",
            DetourDirection::Southwest => "southwest",
        }
    }
}

/// Where a candidate route came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum RouteKind {
    Direct,
    Detour(DetourDirection),
    Waypoint,
    WaypointReversed,
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteKind::Direct => write!(f, "direct"),
            RouteKind::Detour(direction) => write!(f, "detour-{}", direction.as_str()),
            RouteKind::Waypoint => write!(f, "waypoint"),
            RouteKind::WaypointReversed => write!(f, "waypoint-reversed"),
        }
    }
}

impl FromStr for RouteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(RouteKind::Direct),
            "waypoint" => Ok(RouteKind::Waypoint),
            "waypoint-reversed" => Ok(RouteKind::WaypointReversed),
            other => other
                .strip_prefix("detour-")
                .and_then(|name| {
                    DetourDirection::ALL
                        .iter()
                        .find(|direction| direction.as_str() == name)
                })
                .map(|direction| RouteKind::Detour(*direction))
                .ok_or_else(|| format!("Invalid route kind: '{}'", s)),
        }
    }
}

impl TryFrom<String> for RouteKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RouteKind> for String {
    fn from(kind: RouteKind) -> Self {
        kind.to_string()
    }
}

/// One route option produced by the alternative generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateRoute {
    pub id: Uuid,
    pub kind: RouteKind,
    pub geometry: RouteGeometry,
    pub from: RoutePoint,
    pub to: RoutePoint,
    /// Intermediate points the router was asked to pass through
    pub waypoints: Vec<RoutePoint>,
    /// Selection score, set once the selector has ranked the candidate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl CandidateRoute {
    pub fn new(
        kind: RouteKind,
        geometry: RouteGeometry,
        from: RoutePoint,
        to: RoutePoint,
        waypoints: Vec<RoutePoint>,
    ) -> Self {
        CandidateRoute {
            id: Uuid::new_v4(),
            kind,
            geometry,
            from,
            to,
            waypoints,
            score: None,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }
}

/// User objective applied on top of route priority when ranking candidates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteObjective {
    pub avoid_high_traffic: bool,
    pub prefer_safe_routes: bool,
    pub prefer_parks: bool,
}

impl Default for RouteObjective {
    fn default() -> Self {
        RouteObjective {
            avoid_high_traffic: true,
            prefer_safe_routes: true,
            prefer_parks: false,
        }
    }
}

/// Human-readable distance/duration for display next to a route.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteSummaryText {
    pub distance: String,
    pub duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_speed: Option<String>,
}

impl RouteSummaryText {
    pub fn for_geometry(geometry: &RouteGeometry) -> Self {
        RouteSummaryText {
            distance: crate::models::format::format_distance(geometry.distance_meters),
            duration: crate::models::format::format_duration(geometry.duration_seconds),
            average_speed: crate::models::format::format_speed(
                geometry.distance_meters,
                geometry.duration_seconds,
            ),
        }
    }
}

/// A non-winning candidate, kept without its per-segment analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlternativeRouteSummary {
    pub route: CandidateRoute,
    pub route_priority: f64,
    pub score: f64,
    pub summary: RouteSummaryText,
}

/// Result of `build_optimized_route`: the winner with its analysis plus a
/// ranked summary of the other candidates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizedRoute {
    #[serde(flatten)]
    pub route: CandidateRoute,
    /// `None` when no candidate could be analysed and the first generated
    /// candidate was returned as-is
    pub priority_analysis: Option<RoutePriorityAnalysis>,
    pub alternative_routes: Vec<AlternativeRouteSummary>,
    pub summary: RouteSummaryText,
}

// Request/Response types for API endpoints

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizedRouteRequest {
    pub from: RoutePoint,
    pub to: RoutePoint,
    #[serde(default)]
    pub mode: TransportMode,
    #[serde(default)]
    pub waypoints: Vec<RoutePoint>,
    /// Candidates to consider; server default when absent
    pub max_alternatives: Option<usize>,
    pub avoid_high_traffic: Option<bool>,
    pub prefer_safe_routes: Option<bool>,
    pub prefer_parks: Option<bool>,
    pub weather: Option<Weather>,
    /// Local hour (0-23) to score for; defaults to now
    pub hour: Option<u8>,
}

impl OptimizedRouteRequest {
    pub fn validate(&self) -> Result<(), String> {
        self.from.validate()?;
        self.to.validate()?;
        for waypoint in &self.waypoints {
            waypoint.validate()?;
        }
        if self.waypoints.len() + 2 > OSRM_MAX_COORDINATES {
            return Err(format!(
                "At most {} waypoints allowed",
                OSRM_MAX_COORDINATES - 2
            ));
        }
        if let Some(max_alternatives) = self.max_alternatives {
            if !(1..=MAX_ALTERNATIVES_CLAMP).contains(&max_alternatives) {
                return Err(format!(
                    "max_alternatives must be between 1 and {}",
                    MAX_ALTERNATIVES_CLAMP
                ));
            }
        }
        if let Some(hour) = self.hour {
            if hour > 23 {
                return Err("hour must be between 0 and 23".to_string());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrioritizeRouteRequest {
    pub route: RouteGeometry,
    #[serde(default)]
    pub mode: TransportMode,
    pub weather: Option<Weather>,
    pub hour: Option<u8>,
    /// Score under these weights instead of the configured ones
    pub factors: Option<FactorWeights>,
}

impl PrioritizeRouteRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(hour) = self.hour {
            if hour > 23 {
                return Err("hour must be between 0 and 23".to_string());
            }
        }
        Ok(())
    }
}
