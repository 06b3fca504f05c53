use crate::models::coordinates::RoutePoint;
use crate::models::priority::{TimeModifier, WeatherModifier};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Road classes the scorer knows about, ordered from most to least walkable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RoadType {
    Pedestrian,
    Footway,
    Path,
    Cycleway,
    Residential,
    Service,
    Tertiary,
    Secondary,
    Primary,
    Trunk,
    Motorway,
}

impl RoadType {
    pub const ALL: [RoadType; 11] = [
        RoadType::Pedestrian,
        RoadType::Footway,
        RoadType::Path,
        RoadType::Cycleway,
        RoadType::Residential,
        RoadType::Service,
        RoadType::Tertiary,
        RoadType::Secondary,
        RoadType::Primary,
        RoadType::Trunk,
        RoadType::Motorway,
    ];

    /// Fallback for unknown or unavailable road types.
    pub const DEFAULT: RoadType = RoadType::Secondary;

    pub fn as_str(&self) -> &'static str {
        match self {
            RoadType::Pedestrian => "pedestrian",
            RoadType::Footway => "footway",
            RoadType::Path => "path",
            RoadType::Cycleway => "cycleway",
            RoadType::Residential => "residential",
            RoadType::Service => "service",
            RoadType::Tertiary => "tertiary",
            RoadType::Secondary => "secondary",
            RoadType::Primary => "primary",
            RoadType::Trunk => "trunk",
            RoadType::Motorway => "motorway",
        }
    }

    /// Road types with no motor traffic at all.
    pub fn is_car_free(&self) -> bool {
        matches!(
            self,
            RoadType::Pedestrian | RoadType::Footway | RoadType::Path
        )
    }

    /// Map an OSM `highway=*` tag. Link roads collapse onto their parent class;
    /// anything unrecognised becomes [`RoadType::DEFAULT`].
    pub fn from_osm_tag(tag: &str) -> RoadType {
        match tag.trim().to_lowercase().as_str() {
            "pedestrian" | "living_street" => RoadType::Pedestrian,
            "footway" | "sidewalk" | "crossing" => RoadType::Footway,
            "path" | "track" | "bridleway" => RoadType::Path,
            "cycleway" => RoadType::Cycleway,
            "residential" => RoadType::Residential,
            "service" | "unclassified" => RoadType::Service,
            "tertiary" | "tertiary_link" => RoadType::Tertiary,
            "secondary" | "secondary_link" => RoadType::Secondary,
            "primary" | "primary_link" => RoadType::Primary,
            "trunk" | "trunk_link" => RoadType::Trunk,
            "motorway" | "motorway_link" => RoadType::Motorway,
            _ => RoadType::DEFAULT,
        }
    }
}

impl fmt::Display for RoadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoadType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoadType::ALL
            .iter()
            .find(|road_type| road_type.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("Invalid road type: '{}'", s))
    }
}

/// The stretch of a route between two consecutive geometry points, with
/// the attributes looked up for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoadSegment {
    pub index: usize,
    pub start: RoutePoint,
    pub end: RoutePoint,
    pub distance_meters: f64,
    pub road_type: RoadType,
    /// 0 = empty street, 1 = gridlock
    pub traffic_level: f64,
    /// 0 = impassable surface, 1 = perfect
    pub road_quality: f64,
    /// 0 = dangerous, 1 = safe
    pub safety_score: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct SubScores {
    pub speed: f64,
    pub safety: f64,
    pub traffic: f64,
    pub ecology: f64,
    pub comfort: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SegmentModifiers {
    pub time: TimeModifier,
    pub weather: WeatherModifier,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredSegment {
    #[serde(flatten)]
    pub segment: RoadSegment,
    /// Weighted priority in [0, 1]
    pub priority: f64,
    pub scores: SubScores,
    pub modifiers: SegmentModifiers,
}
