use crate::constants::{
    ECOLOGY_BONUS_WEIGHT, HIGH_QUALITY_SEGMENT_BONUS, HIGH_QUALITY_SEGMENT_THRESHOLD,
    LOW_QUALITY_SEGMENT_PENALTY, LOW_QUALITY_SEGMENT_THRESHOLD, ROUTE_PRIORITY_SCALE,
    SAFETY_BONUS_WEIGHT, TRAFFIC_PENALTY_WEIGHT,
};
use crate::error::{AppError, Result};
use crate::models::{CandidateRoute, RouteObjective, RoutePriorityAnalysis, RoutingConfig};
use crate::services::road_priority::{PrioritizeOptions, RoadPriorityService};
use futures::future::join_all;
use std::sync::Arc;

/// A candidate together with the analysis it was ranked on.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub route: CandidateRoute,
    /// `None` only for the unscored fallback winner
    pub analysis: Option<RoutePriorityAnalysis>,
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub winner: ScoredCandidate,
    /// Remaining scored candidates, best first
    pub ranked: Vec<ScoredCandidate>,
}

pub struct RouteSelector {
    prioritizer: Arc<RoadPriorityService>,
}

impl RouteSelector {
    pub fn new(prioritizer: Arc<RoadPriorityService>) -> Self {
        RouteSelector { prioritizer }
    }

    /// Score every candidate under one config snapshot and rank them.
    ///
    /// Candidates whose analysis fails are left out of the ranking. If every
    /// candidate fails, the first one is returned unscored.
    pub async fn select(
        &self,
        candidates: Vec<CandidateRoute>,
        options: &PrioritizeOptions,
        objective: &RouteObjective,
        config: &RoutingConfig,
    ) -> Result<Selection> {
        if candidates.is_empty() {
            return Err(AppError::NoRouteFound(
                "no candidates to select from".to_string(),
            ));
        }

        let analyses = join_all(candidates.iter().map(|candidate| {
            self.prioritizer
                .prioritize_route_with(&candidate.geometry, options, config)
        }))
        .await;

        let mut scored: Vec<ScoredCandidate> = candidates
            .iter()
            .zip(analyses)
            .filter_map(|(candidate, analysis)| match analysis {
                Ok(analysis) => {
                    let score = objective_score(&analysis, objective);
                    tracing::debug!(
                        kind = %candidate.kind,
                        score = %format!("{:.2}", score),
                        route_priority = %format!("{:.3}", analysis.route_priority),
                        "Scored {} candidate: {:.2}",
                        candidate.kind,
                        score
                    );
                    Some(ScoredCandidate {
                        route: candidate.clone().with_score(score),
                        analysis: Some(analysis),
                    })
                }
                Err(e) => {
                    tracing::warn!(
                        kind = %candidate.kind,
                        "Dropping {} candidate, scoring failed: {}",
                        candidate.kind,
                        e
                    );
                    None
                }
            })
            .collect();

        // Vec::sort_by is stable, so equal scores keep generation order
        scored.sort_by(|a, b| {
            let a = a.route.score.unwrap_or(0.0);
            let b = b.route.score.unwrap_or(0.0);
            b.total_cmp(&a)
        });

        let mut ranked = scored.into_iter();
        match ranked.next() {
            Some(winner) => Ok(Selection {
                winner,
                ranked: ranked.collect(),
            }),
            None => {
                tracing::warn!("All candidates failed scoring, using first generated route");
                let mut candidates = candidates.into_iter();
                let first = candidates.next().ok_or_else(|| {
                    AppError::NoRouteFound("no candidates to select from".to_string())
                })?;
                Ok(Selection {
                    winner: ScoredCandidate {
                        route: first,
                        analysis: None,
                    },
                    ranked: Vec::new(),
                })
            }
        }
    }
}

/// Route priority scaled to 0-100, adjusted for the user's objective and for
/// very poor or very good segments. Never negative.
pub fn objective_score(analysis: &RoutePriorityAnalysis, objective: &RouteObjective) -> f64 {
    let mut score = analysis.route_priority * ROUTE_PRIORITY_SCALE;

    if objective.prefer_safe_routes {
        score += analysis.mean_safety() * SAFETY_BONUS_WEIGHT;
    }
    if objective.avoid_high_traffic {
        score -= analysis.mean_traffic() * TRAFFIC_PENALTY_WEIGHT;
    }
    if objective.prefer_parks {
        score += analysis.mean_ecology() * ECOLOGY_BONUS_WEIGHT;
    }

    let poor = analysis
        .segments
        .iter()
        .filter(|s| s.priority < LOW_QUALITY_SEGMENT_THRESHOLD)
        .count();
    let good = analysis
        .segments
        .iter()
        .filter(|s| s.priority > HIGH_QUALITY_SEGMENT_THRESHOLD)
        .count();

    score -= poor as f64 * LOW_QUALITY_SEGMENT_PENALTY;
    score += good as f64 * HIGH_QUALITY_SEGMENT_BONUS;

    score.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::priority::{AnalysisMetadata, TimeModifier, WeatherModifier};
    use crate::models::segment::SegmentModifiers;
    use crate::models::{
        FactorWeights, RoadSegment, RoadType, RouteGeometry, RouteKind, RoutePoint, ScoredSegment,
        SubScores, TransportMode, Weather,
    };
    use crate::services::providers::SegmentProviders;
    use time::macros::datetime;

    fn scored_segment(priority: f64, traffic: f64, safety: f64, ecology: f64) -> ScoredSegment {
        ScoredSegment {
            segment: RoadSegment {
                index: 0,
                start: RoutePoint::new(55.75, 37.62).unwrap(),
                end: RoutePoint::new(55.751, 37.62).unwrap(),
                distance_meters: 100.0,
                road_type: RoadType::Residential,
                traffic_level: traffic,
                road_quality: 0.8,
                safety_score: safety,
            },
            priority,
            scores: SubScores {
                ecology,
                ..Default::default()
            },
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

    fn analysis(route_priority: f64, segments: Vec<ScoredSegment>) -> RoutePriorityAnalysis {
        RoutePriorityAnalysis {
            segments,
            route_priority,
            alternatives_offered: Vec::new(),
            recommendations: Vec::new(),
            statistics: None,
            metadata: AnalysisMetadata {
                analyzed_at: String::new(),
                factors_used: FactorWeights::default(),
                transport_mode: TransportMode::Walking,
                weather: Weather::Clear,
            },
        }
    }

    fn line(points: &[(f64, f64)], distance_meters: f64) -> RouteGeometry {
        RouteGeometry {
            points: points
                .iter()
                .map(|(lat, lon)| RoutePoint::new(*lat, *lon).unwrap())
                .collect(),
            distance_meters,
            duration_seconds: distance_meters / 1.4,
        }
    }

    fn candidate(kind: RouteKind, geometry: RouteGeometry) -> CandidateRoute {
        let from = geometry.points[0];
        let to = *geometry.points.last().unwrap();
        CandidateRoute::new(kind, geometry, from, to, Vec::new())
    }

    fn options() -> PrioritizeOptions {
        PrioritizeOptions {
            current_time: Some(datetime!(2024-05-14 13:00 +3)),
            ..Default::default()
        }
    }

    #[test]
    fn test_objective_score_formula() {
        let analysis = analysis(
            0.6,
            vec![
                scored_segment(0.2, 0.4, 0.8, 0.5),
                scored_segment(0.9, 0.2, 0.6, 0.7),
            ],
        );

        let objective = RouteObjective {
            avoid_high_traffic: true,
            prefer_safe_routes: true,
            prefer_parks: true,
        };
        // 60 + 0.7*20 - 0.3*30 + 0.6*25 - 5 + 3
        let expected = 60.0 + 14.0 - 9.0 + 15.0 - 5.0 + 3.0;
        assert!((objective_score(&analysis, &objective) - expected).abs() < 1e-9);

        let neutral = RouteObjective {
            avoid_high_traffic: false,
            prefer_safe_routes: false,
            prefer_parks: false,
        };
        assert!((objective_score(&analysis, &neutral) - 58.0).abs() < 1e-9);
    }

    #[test]
    fn test_objective_score_never_negative() {
        let analysis = analysis(
            0.1,
            (0..10).map(|_| scored_segment(0.1, 0.9, 0.1, 0.0)).collect(),
        );
        assert_eq!(objective_score(&analysis, &RouteObjective::default()), 0.0);
    }

    #[tokio::test]
    async fn test_select_ranks_and_drops_failures() {
        let service = Arc::new(RoadPriorityService::new(
            SegmentProviders::fixed(RoadType::Footway, 0.1, 0.9, 0.9),
            RoutingConfig::default(),
        ));
        let selector = RouteSelector::new(Arc::clone(&service));
        let config = service.config();

        let broken = RouteGeometry {
            points: vec![RoutePoint::new(55.75, 37.62).unwrap()],
            distance_meters: 0.0,
            duration_seconds: 0.0,
        };
        let candidates = vec![
            candidate(RouteKind::Direct, line(&[(55.75, 37.62), (55.76, 37.62)], 1_100.0)),
            CandidateRoute::new(
                RouteKind::Waypoint,
                broken,
                RoutePoint::new(55.75, 37.62).unwrap(),
                RoutePoint::new(55.76, 37.62).unwrap(),
                Vec::new(),
            ),
            candidate(
                RouteKind::Waypoint,
                line(&[(55.75, 37.62), (55.755, 37.625), (55.76, 37.62)], 1_400.0),
            ),
        ];

        let selection = selector
            .select(candidates, &options(), &RouteObjective::default(), &config)
            .await
            .unwrap();

        assert!(selection.winner.analysis.is_some());
        assert!(selection.winner.route.score.is_some());
        assert_eq!(selection.ranked.len(), 1);
        assert!(selection.winner.route.score >= selection.ranked[0].route.score);
    }

    #[tokio::test]
    async fn test_select_ties_keep_generation_order() {
        let service = Arc::new(RoadPriorityService::new(
            SegmentProviders::fixed(RoadType::Residential, 0.3, 0.8, 0.8),
            RoutingConfig::default(),
        ));
        let selector = RouteSelector::new(Arc::clone(&service));
        let config = service.config();

        let geometry = line(&[(55.75, 37.62), (55.76, 37.62)], 1_100.0);
        let first = candidate(RouteKind::Direct, geometry.clone());
        let second = candidate(
            RouteKind::Detour(crate::models::DetourDirection::North),
            geometry,
        );
        let first_id = first.id;

        let selection = selector
            .select(
                vec![first, second],
                &options(),
                &RouteObjective::default(),
                &config,
            )
            .await
            .unwrap();

        assert_eq!(selection.winner.route.id, first_id);
    }

    #[tokio::test]
    async fn test_select_falls_back_when_all_fail() {
        let service = Arc::new(RoadPriorityService::new(
            SegmentProviders::demo(),
            RoutingConfig::default(),
        ));
        let selector = RouteSelector::new(Arc::clone(&service));
        let config = service.config();

        let broken = |lat: f64| RouteGeometry {
            points: vec![RoutePoint::new(lat, 37.62).unwrap()],
            distance_meters: 0.0,
            duration_seconds: 0.0,
        };
        let from = RoutePoint::new(55.75, 37.62).unwrap();
        let to = RoutePoint::new(55.76, 37.62).unwrap();
        let first = CandidateRoute::new(RouteKind::Direct, broken(55.75), from, to, Vec::new());
        let first_id = first.id;
        let second = CandidateRoute::new(RouteKind::Waypoint, broken(55.76), from, to, Vec::new());

        let selection = selector
            .select(
                vec![first, second],
                &options(),
                &RouteObjective::default(),
                &config,
            )
            .await
            .unwrap();

        assert_eq!(selection.winner.route.id, first_id);
        assert!(selection.winner.analysis.is_none());
        assert!(selection.winner.route.score.is_none());
        assert!(selection.ranked.is_empty());
    }

    #[tokio::test]
    async fn test_select_empty_is_no_route() {
        let service = Arc::new(RoadPriorityService::new(
            SegmentProviders::demo(),
            RoutingConfig::default(),
        ));
        let selector = RouteSelector::new(Arc::clone(&service));

        let err = selector
            .select(
                Vec::new(),
                &options(),
                &RouteObjective::default(),
                &service.config(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoRouteFound(_)));
    }
}
