use crate::constants::{
    DEFAULT_SEGMENT_LOOKUP_CONCURRENCY, NEUTRAL_ROAD_QUALITY, NEUTRAL_SAFETY_SCORE,
    NEUTRAL_TRAFFIC_LEVEL,
};
use crate::error::{AppError, Result};
use crate::models::{RoadSegment, RoadType, RouteGeometry, RoutePoint};
use crate::services::providers::SegmentProviders;
use futures::stream::{self, StreamExt};

/// Splits a route into consecutive-point segments and attaches provider
/// attributes to each.
#[derive(Clone)]
pub struct SegmentAnalyzer {
    providers: SegmentProviders,
    concurrency: usize,
}

impl SegmentAnalyzer {
    pub fn new(providers: SegmentProviders) -> Self {
        SegmentAnalyzer {
            providers,
            concurrency: DEFAULT_SEGMENT_LOOKUP_CONCURRENCY,
        }
    }

    /// Maximum number of segments looked up at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// One segment per consecutive point pair, in route order.
    ///
    /// Never fails because of a provider: a failed lookup is logged and
    /// replaced by that attribute's neutral value.
    pub async fn analyze(&self, route: &RouteGeometry) -> Result<Vec<RoadSegment>> {
        if route.points.len() < 2 {
            return Err(AppError::InvalidRoute(format!(
                "Route needs at least 2 points, got {}",
                route.points.len()
            )));
        }

        // owned endpoints keep the stream future Send for any borrow of `route`
        let pairs: Vec<(usize, RoutePoint, RoutePoint)> = route
            .points
            .windows(2)
            .enumerate()
            .map(|(index, pair)| (index, pair[0], pair[1]))
            .collect();

        let segments: Vec<RoadSegment> = stream::iter(pairs)
            .map(|(index, start, end)| self.analyze_segment(index, start, end))
            .buffered(self.concurrency)
            .collect()
            .await;

        tracing::debug!(
            segments = segments.len(),
            "Analyzed {} route segments",
            segments.len()
        );

        Ok(segments)
    }

    async fn analyze_segment(&self, index: usize, start: RoutePoint, end: RoutePoint) -> RoadSegment {
        let (road_type, traffic, quality, safety) = tokio::join!(
            self.providers.road_type.lookup(&start, &end),
            self.providers.traffic.lookup(&start, &end),
            self.providers.quality.lookup(&start, &end),
            self.providers.safety.lookup(&start, &end),
        );

        let road_type = road_type.unwrap_or_else(|e| {
            log_fallback(index, self.providers.road_type.name(), "road_type", &e);
            RoadType::DEFAULT
        });

        RoadSegment {
            index,
            start,
            end,
            distance_meters: start.distance_to(&end),
            road_type,
            traffic_level: level_or_neutral(
                traffic,
                index,
                self.providers.traffic.name(),
                "traffic_level",
                NEUTRAL_TRAFFIC_LEVEL,
            ),
            road_quality: level_or_neutral(
                quality,
                index,
                self.providers.quality.name(),
                "road_quality",
                NEUTRAL_ROAD_QUALITY,
            ),
            safety_score: level_or_neutral(
                safety,
                index,
                self.providers.safety.name(),
                "safety_score",
                NEUTRAL_SAFETY_SCORE,
            ),
        }
    }
}

fn level_or_neutral(
    result: Result<f64>,
    index: usize,
    provider: &str,
    attribute: &str,
    neutral: f64,
) -> f64 {
    match result {
        Ok(value) if value.is_finite() => value.clamp(0.0, 1.0),
        Ok(value) => {
            let err = AppError::ProviderUnavailable(format!("non-finite value {}", value));
            log_fallback(index, provider, attribute, &err);
            neutral
        }
        Err(e) => {
            log_fallback(index, provider, attribute, &e);
            neutral
        }
    }
}

fn log_fallback(index: usize, provider: &str, attribute: &str, error: &AppError) {
    let error = match error {
        AppError::ProviderUnavailable(_) => error.to_string(),
        other => AppError::ProviderUnavailable(other.to_string()).to_string(),
    };
    tracing::warn!(
        segment = index,
        provider = provider,
        attribute = attribute,
        "{}; using neutral {}",
        error,
        attribute
    );
}
