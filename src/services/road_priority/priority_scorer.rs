use crate::constants::{CAR_FREE_ECOLOGY_BONUS, COMFORT_TRAFFIC_PENALTY, ECOLOGY_TRAFFIC_PENALTY};
use crate::models::priority::{TimeModifier, WeatherModifier};
use crate::models::segment::SegmentModifiers;
use crate::models::{
    FactorWeights, RoadSegment, RoadTypeProfile, RoutingConfig, ScoredSegment, SubScores,
    TimeOfDay, TransportMode, Weather,
};
use time::OffsetDateTime;

/// Conditions one scoring pass runs under.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext {
    pub transport_mode: TransportMode,
    /// Local time; only the hour is used
    pub current_time: OffsetDateTime,
    pub weather: Weather,
    pub factors: FactorWeights,
}

/// Pure per-segment scoring over one config snapshot.
pub struct PriorityScorer<'a> {
    config: &'a RoutingConfig,
}

impl<'a> PriorityScorer<'a> {
    pub fn new(config: &'a RoutingConfig) -> Self {
        PriorityScorer { config }
    }

    pub fn time_modifier(&self, current_time: OffsetDateTime) -> TimeModifier {
        self.config
            .time_of_day
            .modifier(TimeOfDay::from_hour(current_time.hour()))
    }

    pub fn weather_modifier(&self, weather: Weather) -> WeatherModifier {
        self.config.weather_modifiers.modifier(weather)
    }

    pub fn score(&self, segment: &RoadSegment, ctx: &ScoringContext) -> ScoredSegment {
        let profile = self.config.road_profile(segment.road_type);
        let time = self.time_modifier(ctx.current_time);
        let weather = self.weather_modifier(ctx.weather);

        let scores = SubScores {
            speed: clamp01(profile.speed * weather.speed_multiplier),
            safety: clamp01(
                segment.safety_score * time.safety_multiplier * weather.safety_multiplier,
            ),
            traffic: clamp01((1.0 - segment.traffic_level) * time.traffic_multiplier),
            ecology: ecology_score(segment, &profile),
            comfort: comfort_score(segment, &profile),
        };

        ScoredSegment {
            segment: segment.clone(),
            priority: clamp01(ctx.factors.apply(&scores)),
            scores,
            modifiers: SegmentModifiers { time, weather },
        }
    }
}

/// Road-type base, boosted on car-free ways and reduced by traffic.
fn ecology_score(segment: &RoadSegment, profile: &RoadTypeProfile) -> f64 {
    let car_free_bonus = if segment.road_type.is_car_free() {
        1.0 + CAR_FREE_ECOLOGY_BONUS
    } else {
        1.0
    };
    let traffic_penalty = 1.0 - ECOLOGY_TRAFFIC_PENALTY * segment.traffic_level;

    clamp01(profile.ecology * car_free_bonus * traffic_penalty)
}

fn comfort_score(segment: &RoadSegment, profile: &RoadTypeProfile) -> f64 {
    clamp01(
        profile.comfort
            * segment.road_quality
            * (1.0 - COMFORT_TRAFFIC_PENALTY * segment.traffic_level)
            * profile.comfort_multiplier,
    )
}

fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RoadType, RoutePoint};
    use time::macros::datetime;

    fn segment(road_type: RoadType, traffic: f64, quality: f64, safety: f64) -> RoadSegment {
        RoadSegment {
            index: 0,
            start: RoutePoint::new(55.7539, 37.6208).unwrap(),
            end: RoutePoint::new(55.7530, 37.6190).unwrap(),
            distance_meters: 150.0,
            road_type,
            traffic_level: traffic,
            road_quality: quality,
            safety_score: safety,
        }
    }

    fn ctx_at(current_time: OffsetDateTime, weather: Weather) -> ScoringContext {
        ScoringContext {
            transport_mode: TransportMode::Walking,
            current_time,
            weather,
            factors: FactorWeights::default(),
        }
    }

    #[test]
    fn test_time_modifier_periods() {
        let config = RoutingConfig::default();
        let scorer = PriorityScorer::new(&config);

        let morning = scorer.time_modifier(datetime!(2024-05-14 08:30 +3));
        assert_eq!(morning.traffic_multiplier, 1.3);
        assert_eq!(morning.safety_multiplier, 0.9);

        let evening = scorer.time_modifier(datetime!(2024-05-14 18:00 +3));
        assert_eq!(evening.traffic_multiplier, 1.4);

        let night = scorer.time_modifier(datetime!(2024-05-14 23:10 +3));
        assert_eq!(night.safety_multiplier, 0.6);

        let early = scorer.time_modifier(datetime!(2024-05-14 06:59 +3));
        assert_eq!(early.safety_multiplier, 0.6);

        let day = scorer.time_modifier(datetime!(2024-05-14 13:00 +3));
        assert_eq!(day.traffic_multiplier, 1.0);
        assert_eq!(day.safety_multiplier, 1.0);
    }

    #[test]
    fn test_sub_scores_for_footway_at_midday() {
        let config = RoutingConfig::default();
        let scorer = PriorityScorer::new(&config);
        let ctx = ctx_at(datetime!(2024-05-14 13:00 +3), Weather::Clear);

        let scored = scorer.score(&segment(RoadType::Footway, 0.2, 0.9, 0.8), &ctx);

        assert!((scored.scores.speed - 1.0).abs() < 1e-9);
        assert!((scored.scores.safety - 0.8).abs() < 1e-9);
        assert!((scored.scores.traffic - 0.8).abs() < 1e-9);
        // 0.95 * 1.2 * (1 - 0.3 * 0.2) = 1.0716 -> clamped
        assert_eq!(scored.scores.ecology, 1.0);
        // 0.85 * 0.9 * 0.9 * 1.1
        assert!((scored.scores.comfort - 0.757_35).abs() < 1e-9);

        let expected = 0.05 * 1.0 + 0.35 * 0.8 + 0.15 * 0.8 + 0.2 * 1.0 + 0.25 * 0.757_35;
        assert!((scored.priority - expected).abs() < 1e-9);
    }

    #[test]
    fn test_bad_weather_lowers_priority() {
        let config = RoutingConfig::default();
        let scorer = PriorityScorer::new(&config);
        let segment = segment(RoadType::Residential, 0.3, 0.8, 0.9);

        let clear = scorer.score(&segment, &ctx_at(datetime!(2024-05-14 13:00 +3), Weather::Clear));
        let snow = scorer.score(&segment, &ctx_at(datetime!(2024-05-14 13:00 +3), Weather::Snow));

        assert!(snow.priority < clear.priority);
        assert_eq!(snow.modifiers.weather.speed_multiplier, 0.6);
        assert!((snow.scores.safety - 0.9 * 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_priority_bounded_for_extreme_inputs() {
        let config = RoutingConfig::default();
        let scorer = PriorityScorer::new(&config);
        let times = [
            datetime!(2024-05-14 03:00 +3),
            datetime!(2024-05-14 08:00 +3),
            datetime!(2024-05-14 13:00 +3),
            datetime!(2024-05-14 19:00 +3),
        ];
        let weathers = [Weather::Clear, Weather::Rain, Weather::Snow, Weather::Fog];

        for road_type in RoadType::ALL {
            for level in [0.0, 0.5, 1.0] {
                for time in times {
                    for weather in weathers {
                        let scored = scorer.score(
                            &segment(road_type, level, 1.0 - level, level),
                            &ctx_at(time, weather),
                        );
                        assert!(
                            (0.0..=1.0).contains(&scored.priority),
                            "{} priority {}",
                            road_type,
                            scored.priority
                        );
                        for value in [
                            scored.scores.speed,
                            scored.scores.safety,
                            scored.scores.traffic,
                            scored.scores.ecology,
                            scored.scores.comfort,
                        ] {
                            assert!((0.0..=1.0).contains(&value));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let config = RoutingConfig::default();
        let scorer = PriorityScorer::new(&config);
        let ctx = ctx_at(datetime!(2024-05-14 18:30 +3), Weather::Rain);
        let segment = segment(RoadType::Primary, 0.65, 0.75, 0.7);

        assert_eq!(scorer.score(&segment, &ctx), scorer.score(&segment, &ctx));
    }

    #[test]
    fn test_missing_road_type_uses_default_entry() {
        let mut config = RoutingConfig::default();
        config.road_types.remove(&RoadType::Cycleway);
        let scorer = PriorityScorer::new(&config);
        let ctx = ctx_at(datetime!(2024-05-14 13:00 +3), Weather::Clear);

        let cycleway = scorer.score(&segment(RoadType::Cycleway, 0.1, 0.9, 0.9), &ctx);
        let secondary = scorer.score(&segment(RoadType::Secondary, 0.1, 0.9, 0.9), &ctx);
        assert_eq!(cycleway.scores, secondary.scores);

        // an empty table still scores
        config.road_types.clear();
        let scorer = PriorityScorer::new(&config);
        let scored = scorer.score(&segment(RoadType::Cycleway, 0.1, 0.9, 0.9), &ctx);
        assert!((0.0..=1.0).contains(&scored.priority));
    }
}
