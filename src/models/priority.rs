use crate::models::route::TransportMode;
use crate::models::segment::{RoadType, ScoredSegment, SubScores};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Tolerance used when checking that factor weights sum to one.
const WEIGHT_SUM_EPSILON: f64 = 1e-9;

/// One of the five scoring dimensions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Factor {
    Speed,
    Safety,
    Traffic,
    Ecology,
    Comfort,
}

impl FromStr for Factor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "speed" => Ok(Factor::Speed),
            "safety" => Ok(Factor::Safety),
            "traffic" => Ok(Factor::Traffic),
            "ecology" => Ok(Factor::Ecology),
            "comfort" => Ok(Factor::Comfort),
            _ => Err(format!("Invalid factor: '{}'", s)),
        }
    }
}

/// Relative importance of each scoring dimension. Kept normalised so the five
/// weights sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FactorWeights {
    pub speed: f64,
    pub safety: f64,
    pub traffic: f64,
    pub ecology: f64,
    pub comfort: f64,
}

impl Default for FactorWeights {
    /// Pedestrian defaults: safety first, speed barely matters.
    fn default() -> Self {
        FactorWeights {
            speed: 0.05,
            safety: 0.35,
            traffic: 0.15,
            ecology: 0.2,
            comfort: 0.25,
        }
    }
}

impl FactorWeights {
    pub fn total(&self) -> f64 {
        self.speed + self.safety + self.traffic + self.ecology + self.comfort
    }

    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Speed => self.speed,
            Factor::Safety => self.safety,
            Factor::Traffic => self.traffic,
            Factor::Ecology => self.ecology,
            Factor::Comfort => self.comfort,
        }
    }

    fn set(&mut self, factor: Factor, value: f64) {
        match factor {
            Factor::Speed => self.speed = value,
            Factor::Safety => self.safety = value,
            Factor::Traffic => self.traffic = value,
            Factor::Ecology => self.ecology = value,
            Factor::Comfort => self.comfort = value,
        }
    }

    /// Rescale so the weights sum to 1.0. Weights that already sum to 1.0 are
    /// returned untouched so preset values stay exact.
    pub fn normalized(self) -> Result<Self, String> {
        let values = [
            self.speed,
            self.safety,
            self.traffic,
            self.ecology,
            self.comfort,
        ];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err("Factor weights must be finite and non-negative".to_string());
        }

        let total = self.total();
        if total <= 0.0 {
            return Err("At least one factor weight must be positive".to_string());
        }
        if (total - 1.0).abs() <= WEIGHT_SUM_EPSILON {
            return Ok(self);
        }

        Ok(FactorWeights {
            speed: self.speed / total,
            safety: self.safety / total,
            traffic: self.traffic / total,
            ecology: self.ecology / total,
            comfort: self.comfort / total,
        })
    }

    /// Slider semantics: set one weight, then rescale all five proportionally.
    pub fn with_factor(mut self, factor: Factor, value: f64) -> Result<Self, String> {
        self.set(factor, value);
        self.normalized()
    }

    /// Weighted sum of sub-scores.
    pub fn apply(&self, scores: &SubScores) -> f64 {
        scores.speed * self.speed
            + scores.safety * self.safety
            + scores.traffic * self.traffic
            + scores.ecology * self.ecology
            + scores.comfort * self.comfort
    }
}

/// Per-road-type scoring table entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RoadTypeProfile {
    /// Overall desirability for pedestrians
    pub priority: f64,
    /// Walking speed normalised to [0, 1] (km/h divided by the reference speed)
    pub speed: f64,
    pub safety: f64,
    pub comfort: f64,
    /// Base ecology score before traffic penalties
    pub ecology: f64,
    /// Extra comfort scaling (sidewalks, shade, noise)
    pub comfort_multiplier: f64,
}

impl RoadTypeProfile {
    /// Used when neither the segment's road type nor the default road type is
    /// present in the configured table.
    pub const FALLBACK: RoadTypeProfile = RoadTypeProfile {
        priority: 0.3,
        speed: 0.6,
        safety: 0.5,
        comfort: 0.3,
        ecology: 0.5,
        comfort_multiplier: 0.8,
    };

    fn new(
        priority: f64,
        speed_kmh: f64,
        safety: f64,
        comfort: f64,
        ecology: f64,
        comfort_multiplier: f64,
    ) -> Self {
        RoadTypeProfile {
            priority,
            speed: speed_kmh / crate::constants::REFERENCE_WALKING_SPEED_KMH,
            safety,
            comfort,
            ecology,
            comfort_multiplier,
        }
    }

    pub fn default_for(road_type: RoadType) -> RoadTypeProfile {
        match road_type {
            RoadType::Pedestrian => Self::new(1.0, 5.0, 0.95, 0.9, 1.0, 1.2),
            RoadType::Footway => Self::new(0.95, 5.0, 0.9, 0.85, 0.95, 1.1),
            RoadType::Path => Self::new(0.9, 4.0, 0.85, 0.8, 1.0, 1.15),
            RoadType::Cycleway => Self::new(0.7, 4.0, 0.8, 0.7, 0.9, 1.0),
            RoadType::Residential => Self::new(0.6, 4.0, 0.75, 0.6, 0.8, 0.9),
            RoadType::Service => Self::new(0.5, 3.0, 0.7, 0.5, 0.7, 0.8),
            RoadType::Tertiary => Self::new(0.4, 3.0, 0.6, 0.4, 0.6, 0.7),
            RoadType::Secondary => Self::new(0.3, 3.0, 0.5, 0.3, 0.4, 0.6),
            RoadType::Primary => Self::new(0.2, 3.0, 0.4, 0.2, 0.3, 0.5),
            RoadType::Trunk => Self::new(0.1, 3.0, 0.3, 0.1, 0.2, 0.3),
            RoadType::Motorway => Self::new(0.05, 3.0, 0.2, 0.05, 0.1, 0.1),
        }
    }

    pub fn default_table() -> BTreeMap<RoadType, RoadTypeProfile> {
        RoadType::ALL
            .iter()
            .map(|road_type| (*road_type, Self::default_for(*road_type)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Day,
    Evening,
    Night,
}

impl TimeOfDay {
    /// Morning 7-10h, evening 17-20h, night 22-6h, day otherwise.
    pub fn from_hour(hour: u8) -> TimeOfDay {
        match hour {
            7..=10 => TimeOfDay::Morning,
            17..=20 => TimeOfDay::Evening,
            h if h >= 22 || h <= 6 => TimeOfDay::Night,
            _ => TimeOfDay::Day,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimeModifier {
    pub traffic_multiplier: f64,
    pub safety_multiplier: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimeOfDayTable {
    pub morning: TimeModifier,
    pub day: TimeModifier,
    pub evening: TimeModifier,
    pub night: TimeModifier,
}

impl Default for TimeOfDayTable {
    fn default() -> Self {
        TimeOfDayTable {
            morning: TimeModifier {
                traffic_multiplier: 1.3,
                safety_multiplier: 0.9,
            },
            day: TimeModifier {
                traffic_multiplier: 1.0,
                safety_multiplier: 1.0,
            },
            evening: TimeModifier {
                traffic_multiplier: 1.4,
                safety_multiplier: 0.8,
            },
            night: TimeModifier {
                traffic_multiplier: 0.7,
                safety_multiplier: 0.6,
            },
        }
    }
}

impl TimeOfDayTable {
    pub fn modifier(&self, period: TimeOfDay) -> TimeModifier {
        match period {
            TimeOfDay::Morning => self.morning,
            TimeOfDay::Day => self.day,
            TimeOfDay::Evening => self.evening,
            TimeOfDay::Night => self.night,
        }
    }
}

/// Unknown weather strings deserialize to [`Weather::Clear`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Weather {
    #[default]
    Clear,
    Rain,
    Snow,
    Fog,
}

impl From<String> for Weather {
    fn from(value: String) -> Self {
        Weather::from(value.as_str())
    }
}

impl From<&str> for Weather {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "rain" => Weather::Rain,
            "snow" => Weather::Snow,
            "fog" => Weather::Fog,
            _ => Weather::Clear,
        }
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weather::Clear => write!(f, "clear"),
            Weather::Rain => write!(f, "rain"),
            Weather::Snow => write!(f, "snow"),
            Weather::Fog => write!(f, "fog"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WeatherModifier {
    pub speed_multiplier: f64,
    pub safety_multiplier: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WeatherTable {
    pub clear: WeatherModifier,
    pub rain: WeatherModifier,
    pub snow: WeatherModifier,
    pub fog: WeatherModifier,
}

impl Default for WeatherTable {
    fn default() -> Self {
        WeatherTable {
            clear: WeatherModifier {
                speed_multiplier: 1.0,
                safety_multiplier: 1.0,
            },
            rain: WeatherModifier {
                speed_multiplier: 0.8,
                safety_multiplier: 0.7,
            },
            snow: WeatherModifier {
                speed_multiplier: 0.6,
                safety_multiplier: 0.5,
            },
            fog: WeatherModifier {
                speed_multiplier: 0.7,
                safety_multiplier: 0.6,
            },
        }
    }
}

impl WeatherTable {
    pub fn modifier(&self, weather: Weather) -> WeatherModifier {
        match weather {
            Weather::Clear => self.clear,
            Weather::Rain => self.rain,
            Weather::Snow => self.snow,
            Weather::Fog => self.fog,
        }
    }
}

/// Everything the scorer and selector read. Shared as an `Arc` snapshot and
/// only ever replaced as a whole.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutingConfig {
    pub factors: FactorWeights,
    pub road_types: BTreeMap<RoadType, RoadTypeProfile>,
    pub time_of_day: TimeOfDayTable,
    pub weather_modifiers: WeatherTable,
    /// Weather assumed when a request does not say
    pub weather: Weather,
    pub avoid_high_traffic: bool,
    pub prefer_safe_routes: bool,
    pub prefer_parks: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        RoutingConfig {
            factors: FactorWeights::default(),
            road_types: RoadTypeProfile::default_table(),
            time_of_day: TimeOfDayTable::default(),
            weather_modifiers: WeatherTable::default(),
            weather: Weather::Clear,
            avoid_high_traffic: true,
            prefer_safe_routes: true,
            prefer_parks: false,
        }
    }
}

impl RoutingConfig {
    /// Profile for `road_type`, falling back to the default road type's entry
    /// and then to [`RoadTypeProfile::FALLBACK`].
    pub fn road_profile(&self, road_type: RoadType) -> RoadTypeProfile {
        self.road_types
            .get(&road_type)
            .or_else(|| self.road_types.get(&RoadType::DEFAULT))
            .copied()
            .unwrap_or(RoadTypeProfile::FALLBACK)
    }

    /// Shallow-merge `update` into a copy of this config. Factor weights are
    /// renormalised after the merge.
    pub fn merged(&self, update: &RoutingConfigUpdate) -> Result<RoutingConfig, String> {
        let mut next = self.clone();

        let mut factors = update.factors.unwrap_or(next.factors);
        for (factor, value) in update.single_factor_edits() {
            factors.set(factor, value);
        }
        next.factors = factors.normalized()?;

        if let Some(ref road_types) = update.road_types {
            for (road_type, profile) in road_types {
                next.road_types.insert(*road_type, *profile);
            }
        }
        if let Some(time_of_day) = update.time_of_day {
            next.time_of_day = time_of_day;
        }
        if let Some(weather_modifiers) = update.weather_modifiers {
            next.weather_modifiers = weather_modifiers;
        }
        if let Some(weather) = update.weather {
            next.weather = weather;
        }
        if let Some(avoid) = update.avoid_high_traffic {
            next.avoid_high_traffic = avoid;
        }
        if let Some(safe) = update.prefer_safe_routes {
            next.prefer_safe_routes = safe;
        }
        if let Some(parks) = update.prefer_parks {
            next.prefer_parks = parks;
        }

        Ok(next)
    }
}

/// Partial [`RoutingConfig`]; every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RoutingConfigUpdate {
    /// Replace all five weights at once (renormalised)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factors: Option<FactorWeights>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecology: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comfort: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road_types: Option<BTreeMap<RoadType, RoadTypeProfile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<TimeOfDayTable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_modifiers: Option<WeatherTable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<Weather>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avoid_high_traffic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefer_safe_routes: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefer_parks: Option<bool>,
}

impl RoutingConfigUpdate {
    pub fn with_factors(factors: FactorWeights) -> Self {
        RoutingConfigUpdate {
            factors: Some(factors),
            ..Default::default()
        }
    }

    pub fn with_factor(factor: Factor, value: f64) -> Self {
        let mut update = RoutingConfigUpdate::default();
        match factor {
            Factor::Speed => update.speed = Some(value),
            Factor::Safety => update.safety = Some(value),
            Factor::Traffic => update.traffic = Some(value),
            Factor::Ecology => update.ecology = Some(value),
            Factor::Comfort => update.comfort = Some(value),
        }
        update
    }

    fn single_factor_edits(&self) -> Vec<(Factor, f64)> {
        [
            (Factor::Speed, self.speed),
            (Factor::Safety, self.safety),
            (Factor::Traffic, self.traffic),
            (Factor::Ecology, self.ecology),
            (Factor::Comfort, self.comfort),
        ]
        .into_iter()
        .filter_map(|(factor, value)| value.map(|v| (factor, v)))
        .collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PresetKind {
    Safest,
    Comfort,
    Eco,
    Quiet,
    Shortest,
}

impl PresetKind {
    pub const ALL: [PresetKind; 5] = [
        PresetKind::Safest,
        PresetKind::Comfort,
        PresetKind::Eco,
        PresetKind::Quiet,
        PresetKind::Shortest,
    ];

    pub fn factors(&self) -> FactorWeights {
        match self {
            PresetKind::Safest => FactorWeights {
                speed: 0.05,
                safety: 0.5,
                traffic: 0.05,
                ecology: 0.15,
                comfort: 0.25,
            },
            PresetKind::Comfort => FactorWeights {
                speed: 0.05,
                safety: 0.3,
                traffic: 0.05,
                ecology: 0.15,
                comfort: 0.45,
            },
            PresetKind::Eco => FactorWeights {
                speed: 0.02,
                safety: 0.25,
                traffic: 0.03,
                ecology: 0.4,
                comfort: 0.3,
            },
            PresetKind::Quiet => FactorWeights {
                speed: 0.02,
                safety: 0.3,
                traffic: 0.4,
                ecology: 0.08,
                comfort: 0.2,
            },
            PresetKind::Shortest => FactorWeights {
                speed: 0.3,
                safety: 0.25,
                traffic: 0.1,
                ecology: 0.15,
                comfort: 0.2,
            },
        }
    }
}

impl fmt::Display for PresetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetKind::Safest => write!(f, "safest"),
            PresetKind::Comfort => write!(f, "comfort"),
            PresetKind::Eco => write!(f, "eco"),
            PresetKind::Quiet => write!(f, "quiet"),
            PresetKind::Shortest => write!(f, "shortest"),
        }
    }
}

impl FromStr for PresetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetKind::ALL
            .iter()
            .find(|kind| kind.to_string().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("Invalid preset: '{}'", s))
    }
}

/// Named one-click routing style.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlternativePreset {
    pub kind: PresetKind,
    pub name: String,
    pub description: String,
    pub factors: FactorWeights,
}

impl AlternativePreset {
    /// The static five-entry catalog.
    pub fn catalog() -> Vec<AlternativePreset> {
        PresetKind::ALL
            .iter()
            .map(|kind| {
                let (name, description) = match kind {
                    PresetKind::Safest => (
                        "Safest",
                        "Sidewalks and pedestrian zones wherever possible",
                    ),
                    PresetKind::Comfort => (
                        "Most comfortable",
                        "Well-surfaced, convenient pedestrian ways",
                    ),
                    PresetKind::Eco => ("Through parks", "Parks and green areas"),
                    PresetKind::Quiet => ("Quiet", "Away from car traffic and noise"),
                    PresetKind::Shortest => (
                        "Shortest",
                        "The shortest route, possibly less comfortable",
                    ),
                };
                AlternativePreset {
                    kind: *kind,
                    name: name.to_string(),
                    description: description.to_string(),
                    factors: kind.factors(),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Warning,
    Traffic,
    Safety,
    Success,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub title: String,
    pub message: String,
    /// Number of segments that triggered the rule (0 for route-wide rules)
    pub segment_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriorityStatistics {
    pub total_segments: usize,
    pub average_priority: f64,
    pub high_priority_segments: usize,
    pub low_priority_segments: usize,
    pub average_scores: SubScores,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisMetadata {
    /// RFC 3339 timestamp
    pub analyzed_at: String,
    pub factors_used: FactorWeights,
    pub transport_mode: TransportMode,
    pub weather: Weather,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutePriorityAnalysis {
    pub segments: Vec<ScoredSegment>,
    /// Distance-weighted mean segment priority in [0, 1]
    pub route_priority: f64,
    pub alternatives_offered: Vec<AlternativePreset>,
    pub recommendations: Vec<Recommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<PriorityStatistics>,
    pub metadata: AnalysisMetadata,
}

impl RoutePriorityAnalysis {
    fn mean_of(&self, value: impl Fn(&ScoredSegment) -> f64) -> f64 {
        if self.segments.is_empty() {
            return 0.0;
        }
        self.segments.iter().map(value).sum::<f64>() / self.segments.len() as f64
    }

    /// Mean raw safety score reported by the safety provider.
    pub fn mean_safety(&self) -> f64 {
        self.mean_of(|s| s.segment.safety_score)
    }

    /// Mean raw traffic level reported by the traffic provider.
    pub fn mean_traffic(&self) -> f64 {
        self.mean_of(|s| s.segment.traffic_level)
    }

    pub fn mean_ecology(&self) -> f64 {
        self.mean_of(|s| s.scores.ecology)
    }

    pub fn mean_priority(&self) -> f64 {
        self.mean_of(|s| s.priority)
    }
}
