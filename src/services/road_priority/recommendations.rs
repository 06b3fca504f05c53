use crate::constants::{
    EXCELLENT_ROUTE_THRESHOLD, HIGH_PRIORITY_STAT_THRESHOLD, HIGH_TRAFFIC_THRESHOLD,
    LOW_PRIORITY_THRESHOLD, LOW_SAFETY_THRESHOLD,
};
use crate::models::priority::PriorityStatistics;
use crate::models::{Recommendation, RecommendationKind, ScoredSegment, SubScores};

/// Distance-weighted mean segment priority; 0 for a zero-length route.
pub fn route_priority(segments: &[ScoredSegment]) -> f64 {
    let total_distance: f64 = segments.iter().map(|s| s.segment.distance_meters).sum();
    if total_distance <= 0.0 {
        return 0.0;
    }

    let weighted: f64 = segments
        .iter()
        .map(|s| s.priority * s.segment.distance_meters)
        .sum();

    weighted / total_distance
}

/// Advice derived from the scored segments. Rules are independent; any
/// number of them may fire.
pub fn generate_recommendations(segments: &[ScoredSegment]) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    let low_priority = segments
        .iter()
        .filter(|s| s.priority < LOW_PRIORITY_THRESHOLD)
        .count();
    let high_traffic = segments
        .iter()
        .filter(|s| s.segment.traffic_level > HIGH_TRAFFIC_THRESHOLD)
        .count();
    let low_safety = segments
        .iter()
        .filter(|s| s.segment.safety_score < LOW_SAFETY_THRESHOLD)
        .count();

    if low_priority > 0 {
        recommendations.push(Recommendation {
            kind: RecommendationKind::Warning,
            title: "Problematic segments".to_string(),
            message: format!(
                "Found {} low-priority segments. Consider an alternative route.",
                low_priority
            ),
            segment_count: low_priority,
        });
    }

    if high_traffic > 0 {
        recommendations.push(Recommendation {
            kind: RecommendationKind::Traffic,
            title: "High congestion".to_string(),
            message: format!(
                "{} segments with heavy traffic. Leave later or pick another route.",
                high_traffic
            ),
            segment_count: high_traffic,
        });
    }

    if low_safety > 0 {
        recommendations.push(Recommendation {
            kind: RecommendationKind::Safety,
            title: "Safety caution".to_string(),
            message: format!(
                "{} segments need extra attention. Take care, especially after dark.",
                low_safety
            ),
            segment_count: low_safety,
        });
    }

    if !segments.is_empty() && mean(segments, |s| s.priority) > EXCELLENT_ROUTE_THRESHOLD {
        recommendations.push(Recommendation {
            kind: RecommendationKind::Success,
            title: "Excellent route".to_string(),
            message: "This route matches your preferences well.".to_string(),
            segment_count: 0,
        });
    }

    recommendations
}

/// Summary counts and averages; `None` for no segments.
pub fn compute_statistics(segments: &[ScoredSegment]) -> Option<PriorityStatistics> {
    if segments.is_empty() {
        return None;
    }

    Some(PriorityStatistics {
        total_segments: segments.len(),
        average_priority: mean(segments, |s| s.priority),
        high_priority_segments: segments
            .iter()
            .filter(|s| s.priority > HIGH_PRIORITY_STAT_THRESHOLD)
            .count(),
        low_priority_segments: segments
            .iter()
            .filter(|s| s.priority < LOW_PRIORITY_THRESHOLD)
            .count(),
        average_scores: SubScores {
            speed: mean(segments, |s| s.scores.speed),
            safety: mean(segments, |s| s.scores.safety),
            traffic: mean(segments, |s| s.scores.traffic),
            ecology: mean(segments, |s| s.scores.ecology),
            comfort: mean(segments, |s| s.scores.comfort),
        },
    })
}

fn mean(segments: &[ScoredSegment], value: impl Fn(&ScoredSegment) -> f64) -> f64 {
    segments.iter().map(value).sum::<f64>() / segments.len() as f64
}
