pub mod priority_scorer;
pub mod recommendations;
pub mod segment_analyzer;

pub use priority_scorer::{PriorityScorer, ScoringContext};
pub use segment_analyzer::SegmentAnalyzer;

use crate::error::{AppError, Result};
use crate::models::priority::AnalysisMetadata;
use crate::models::{
    AlternativePreset, FactorWeights, PresetKind, RouteGeometry, RoutePriorityAnalysis,
    RoutingConfig, RoutingConfigUpdate, ScoredSegment, TransportMode, Weather,
};
use crate::services::providers::SegmentProviders;
use std::sync::{Arc, PoisonError, RwLock};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

/// Per-call overrides for [`RoadPriorityService::prioritize_route`]. Unset
/// fields come from the current config (weather, factors) or the clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrioritizeOptions {
    pub transport_mode: TransportMode,
    pub current_time: Option<OffsetDateTime>,
    pub weather: Option<Weather>,
    pub factors: Option<FactorWeights>,
}

/// Scores routes against a shared, replaceable [`RoutingConfig`].
pub struct RoadPriorityService {
    analyzer: SegmentAnalyzer,
    defaults: Arc<RoutingConfig>,
    config: RwLock<Arc<RoutingConfig>>,
    local_offset: UtcOffset,
}

impl RoadPriorityService {
    pub fn new(providers: SegmentProviders, defaults: RoutingConfig) -> Self {
        let defaults = Arc::new(defaults);
        RoadPriorityService {
            analyzer: SegmentAnalyzer::new(providers),
            config: RwLock::new(Arc::clone(&defaults)),
            defaults,
            local_offset: UtcOffset::UTC,
        }
    }

    pub fn with_lookup_concurrency(mut self, concurrency: usize) -> Self {
        self.analyzer = self.analyzer.with_concurrency(concurrency);
        self
    }

    /// Offset used to read the hour for time-of-day modifiers.
    pub fn with_local_offset(mut self, offset: UtcOffset) -> Self {
        self.local_offset = offset;
        self
    }

    /// Current config snapshot. Later updates do not affect it.
    pub fn config(&self) -> Arc<RoutingConfig> {
        Arc::clone(&self.config.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Shallow-merge `update` into the current config and swap it in.
    /// Factor weights are renormalised to sum to 1.
    pub fn update_config(&self, update: &RoutingConfigUpdate) -> Result<Arc<RoutingConfig>> {
        let mut guard = self.config.write().unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new(guard.merged(update).map_err(AppError::InvalidRequest)?);
        *guard = Arc::clone(&next);

        tracing::info!(
            speed = next.factors.speed,
            safety = next.factors.safety,
            traffic = next.factors.traffic,
            ecology = next.factors.ecology,
            comfort = next.factors.comfort,
            "Routing config updated"
        );

        Ok(next)
    }

    pub fn apply_preset(&self, kind: PresetKind) -> Result<Arc<RoutingConfig>> {
        tracing::info!(preset = %kind, "Applying routing preset {}", kind);
        self.update_config(&RoutingConfigUpdate::with_factors(kind.factors()))
    }

    pub fn reset_to_defaults(&self) -> Arc<RoutingConfig> {
        let mut guard = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::clone(&self.defaults);
        tracing::info!("Routing config reset to defaults");
        Arc::clone(&self.defaults)
    }

    pub fn list_alternative_presets(&self) -> Vec<AlternativePreset> {
        AlternativePreset::catalog()
    }

    pub fn local_now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.local_offset)
    }

    /// Today, local time, at `hour`:00.
    pub fn local_time_at_hour(&self, hour: u8) -> Result<OffsetDateTime> {
        self.local_now()
            .replace_time(time::Time::MIDNIGHT)
            .replace_hour(hour)
            .map_err(|e| AppError::InvalidRequest(format!("Invalid hour {}: {}", hour, e)))
    }

    pub async fn prioritize_route(
        &self,
        route: &RouteGeometry,
        options: &PrioritizeOptions,
    ) -> Result<RoutePriorityAnalysis> {
        let config = self.config();
        self.prioritize_route_with(route, options, &config).await
    }

    /// Same as [`prioritize_route`](Self::prioritize_route) against an explicit
    /// snapshot, so several routes can be compared under one config.
    pub async fn prioritize_route_with(
        &self,
        route: &RouteGeometry,
        options: &PrioritizeOptions,
        config: &RoutingConfig,
    ) -> Result<RoutePriorityAnalysis> {
        route.validate().map_err(AppError::InvalidRoute)?;

        let factors = match options.factors {
            Some(factors) => factors.normalized().map_err(AppError::InvalidRequest)?,
            None => config.factors,
        };
        let ctx = ScoringContext {
            transport_mode: options.transport_mode,
            current_time: options.current_time.unwrap_or_else(|| self.local_now()),
            weather: options.weather.unwrap_or(config.weather),
            factors,
        };

        let segments = self.analyzer.analyze(route).await?;

        let scorer = PriorityScorer::new(config);
        let scored: Vec<ScoredSegment> = segments.iter().map(|s| scorer.score(s, &ctx)).collect();

        let route_priority = recommendations::route_priority(&scored);

        tracing::debug!(
            segments = scored.len(),
            route_priority = %format!("{:.3}", route_priority),
            weather = %ctx.weather,
            mode = %ctx.transport_mode,
            "Route prioritized: {} segments, priority {:.3}",
            scored.len(),
            route_priority
        );

        Ok(RoutePriorityAnalysis {
            recommendations: recommendations::generate_recommendations(&scored),
            statistics: recommendations::compute_statistics(&scored),
            route_priority,
            alternatives_offered: self.list_alternative_presets(),
            metadata: AnalysisMetadata {
                analyzed_at: OffsetDateTime::now_utc()
                    .format(&Rfc3339)
                    .unwrap_or_default(),
                factors_used: factors,
                transport_mode: ctx.transport_mode,
                weather: ctx.weather,
            },
            segments: scored,
        })
    }
}
