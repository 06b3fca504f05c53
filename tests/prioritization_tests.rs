use citystep::models::priority::{TimeModifier, WeatherModifier};
use citystep::models::segment::SegmentModifiers;
use citystep::models::{
    Factor, FactorWeights, PresetKind, RoadSegment, RoadType, RoutePoint, RoutingConfig,
    RoutingConfigUpdate, ScoredSegment, SubScores, TransportMode, Weather,
};
use citystep::services::road_priority::recommendations::route_priority;
use citystep::services::road_priority::{PriorityScorer, ScoringContext, SegmentAnalyzer};
use citystep::services::{PrioritizeOptions, RoadPriorityService, SegmentProviders};
use std::sync::Arc;
use time::macros::datetime;

mod common;

fn segment(road_type: RoadType, traffic: f64, quality: f64, safety: f64) -> RoadSegment {
    RoadSegment {
        index: 0,
        start: common::kremlin(),
        end: RoutePoint::new(55.7530, 37.6190).unwrap(),
        distance_meters: 150.0,
        road_type,
        traffic_level: traffic,
        road_quality: quality,
        safety_score: safety,
    }
}

fn scored(distance_meters: f64, priority: f64) -> ScoredSegment {
    let mut segment = segment(RoadType::Residential, 0.3, 0.8, 0.9);
    segment.distance_meters = distance_meters;
    ScoredSegment {
        segment,
        priority,
        scores: SubScores::default(),
        modifiers: SegmentModifiers {
            time: TimeModifier {
                traffic_multiplier: 1.0,
                safety_multiplier: 1.0,
            },
            weather: WeatherModifier {
                speed_multiplier: 1.0,
                safety_multiplier: 1.0,
            },
        },
    }
}

fn midday_walk() -> PrioritizeOptions {
    PrioritizeOptions {
        transport_mode: TransportMode::Walking,
        current_time: Some(datetime!(2024-05-14 13:00 +3)),
        weather: Some(Weather::Clear),
        factors: None,
    }
}

fn walk() -> citystep::models::RouteGeometry {
    common::geometry(
        vec![
            common::kremlin(),
            RoutePoint::new(55.7501, 37.6170).unwrap(),
            RoutePoint::new(55.7452, 37.6121).unwrap(),
            RoutePoint::new(55.7398, 37.6080).unwrap(),
            RoutePoint::new(55.7345, 37.6049).unwrap(),
            common::gorky_park(),
        ],
        3_100.0,
    )
}

fn assert_normalized(factors: &FactorWeights) {
    assert!(
        (factors.total() - 1.0).abs() < 1e-6,
        "weights sum to {}",
        factors.total()
    );
}

#[test]
fn test_weights_stay_normalized_after_updates() {
    let service = common::fixed_priority_service();

    let config = service
        .update_config(&RoutingConfigUpdate::with_factors(FactorWeights {
            speed: 2.0,
            safety: 4.0,
            traffic: 1.0,
            ecology: 1.0,
            comfort: 2.0,
        }))
        .unwrap();
    assert_normalized(&config.factors);
    assert!((config.factors.safety - 0.4).abs() < 1e-9);

    for (factor, value) in [
        (Factor::Safety, 0.9),
        (Factor::Speed, 0.0),
        (Factor::Comfort, 3.5),
        (Factor::Traffic, 0.01),
    ] {
        let config = service
            .update_config(&RoutingConfigUpdate::with_factor(factor, value))
            .unwrap();
        assert_normalized(&config.factors);
    }
}

#[test]
fn test_rejected_update_keeps_previous_config() {
    let service = common::fixed_priority_service();
    let before = service.config();

    let result = service.update_config(&RoutingConfigUpdate::with_factors(FactorWeights {
        speed: 0.0,
        safety: 0.0,
        traffic: 0.0,
        ecology: 0.0,
        comfort: 0.0,
    }));

    assert!(result.is_err());
    assert_eq!(service.config().factors, before.factors);
}

#[test]
fn test_priority_is_bounded_for_all_inputs() {
    let config = RoutingConfig::default();
    let scorer = PriorityScorer::new(&config);
    let levels = [0.0, 0.25, 0.5, 0.75, 1.0];
    let times = [
        datetime!(2024-05-14 03:00 +3),
        datetime!(2024-05-14 08:00 +3),
        datetime!(2024-05-14 13:00 +3),
        datetime!(2024-05-14 18:00 +3),
    ];
    let factor_sets = [
        FactorWeights::default(),
        PresetKind::Shortest.factors(),
        PresetKind::Quiet.factors(),
    ];

    for road_type in RoadType::ALL {
        for traffic in levels {
            for quality in levels {
                for safety in levels {
                    for weather in [Weather::Clear, Weather::Rain, Weather::Snow, Weather::Fog] {
                        for current_time in times {
                            for factors in factor_sets {
                                let ctx = ScoringContext {
                                    transport_mode: TransportMode::Walking,
                                    current_time,
                                    weather,
                                    factors,
                                };
                                let result = scorer
                                    .score(&segment(road_type, traffic, quality, safety), &ctx);
                                assert!(
                                    (0.0..=1.0).contains(&result.priority),
                                    "{:?} gave priority {}",
                                    road_type,
                                    result.priority
                                );
                            }
                        }
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
    let ctx = ScoringContext {
        transport_mode: TransportMode::Walking,
        current_time: datetime!(2024-05-14 18:30 +3),
        weather: Weather::Rain,
        factors: FactorWeights::default(),
    };
    let input = segment(RoadType::Tertiary, 0.45, 0.7, 0.65);

    let first = scorer.score(&input, &ctx);
    let second = scorer.score(&input, &ctx);

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_demo_analysis_is_repeatable() {
    let service = RoadPriorityService::new(SegmentProviders::demo(), RoutingConfig::default());
    let route = walk();

    let first = service.prioritize_route(&route, &midday_walk()).await.unwrap();
    let second = service.prioritize_route(&route, &midday_walk()).await.unwrap();

    assert_eq!(first.segments, second.segments);
    assert_eq!(first.route_priority, second.route_priority);
}

#[test]
fn test_route_priority_is_distance_weighted() {
    let segments = vec![scored(100.0, 0.2), scored(300.0, 0.8)];

    let priority = route_priority(&segments);

    assert!((priority - 0.65).abs() < 1e-12);
}

#[tokio::test]
async fn test_failed_traffic_lookup_falls_back_to_neutral() {
    let route = walk();
    let failing_start = route.points[2];
    let providers = SegmentProviders::fixed(RoadType::Footway, 0.2, 0.9, 0.85).with_traffic(
        Arc::new(common::FailingAtProvider {
            fail_at: failing_start,
            value: 0.2,
        }),
    );

    let segments = SegmentAnalyzer::new(providers).analyze(&route).await.unwrap();

    assert_eq!(segments.len(), 5);
    for segment in &segments {
        if segment.index == 2 {
            assert_eq!(segment.traffic_level, 0.5);
        } else {
            assert_eq!(segment.traffic_level, 0.2);
        }
        assert_eq!(segment.road_type, RoadType::Footway);
    }
    let indices: Vec<usize> = segments.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_safest_preset_raises_priority_of_safe_route() {
    let service = RoadPriorityService::new(
        SegmentProviders::fixed(RoadType::Residential, 0.6, 0.5, 1.0),
        RoutingConfig::default(),
    );
    let route = walk();

    let default_analysis = service.prioritize_route(&route, &midday_walk()).await.unwrap();

    let config = service.apply_preset(PresetKind::Safest).unwrap();
    assert_eq!(config.factors.safety, 0.5);
    assert_eq!(config.factors, PresetKind::Safest.factors());

    let safest_analysis = service.prioritize_route(&route, &midday_walk()).await.unwrap();

    let default_contribution = default_analysis.mean_safety() * FactorWeights::default().safety;
    let safest_contribution = safest_analysis.mean_safety() * config.factors.safety;
    assert!(safest_contribution > default_contribution);
    assert!(safest_analysis.route_priority >= default_analysis.route_priority);
    assert_eq!(safest_analysis.metadata.factors_used.safety, 0.5);
}

#[tokio::test]
async fn test_reset_restores_default_weights() {
    let service = common::fixed_priority_service();

    service.apply_preset(PresetKind::Eco).unwrap();
    assert_eq!(service.config().factors.ecology, 0.4);

    let config = service.reset_to_defaults();
    assert_eq!(config.factors, FactorWeights::default());
}

#[tokio::test]
async fn test_per_call_factors_do_not_touch_config() {
    let service = common::fixed_priority_service();
    let route = walk();
    let options = PrioritizeOptions {
        factors: Some(FactorWeights {
            speed: 0.0,
            safety: 2.0,
            traffic: 0.0,
            ecology: 0.0,
            comfort: 0.0,
        }),
        ..midday_walk()
    };

    let analysis = service.prioritize_route(&route, &options).await.unwrap();

    assert_eq!(analysis.metadata.factors_used.safety, 1.0);
    assert_eq!(service.config().factors, FactorWeights::default());
    // residential, safety 0.9 at midday in clear weather
    assert!((analysis.route_priority - 0.9).abs() < 1e-9);
}

#[tokio::test]
async fn test_single_point_route_is_rejected() {
    let service = common::fixed_priority_service();
    let route = common::geometry(vec![common::kremlin()], 0.0);

    let result = service.prioritize_route(&route, &midday_walk()).await;

    assert!(matches!(result, Err(citystep::AppError::InvalidRoute(_))));
}
