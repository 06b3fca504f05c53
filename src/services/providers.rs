//! Per-segment attribute lookups (road type, traffic, road quality, safety).
//!
//! The analyzer only sees [`AttributeProvider`]; which backend answers is
//! decided when [`SegmentProviders`] is assembled.

use crate::error::Result;
use crate::models::{RoadType, RoutePoint};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::ops::Range;
use std::sync::Arc;

/// Looks up one attribute of the segment `start -> end`.
#[async_trait]
pub trait AttributeProvider<T: Send>: Send + Sync {
    async fn lookup(&self, start: &RoutePoint, end: &RoutePoint) -> Result<T>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// The four providers the segment analyzer queries for every segment.
#[derive(Clone)]
pub struct SegmentProviders {
    pub road_type: Arc<dyn AttributeProvider<RoadType>>,
    /// Congestion in [0, 1], 1 = jammed
    pub traffic: Arc<dyn AttributeProvider<f64>>,
    /// Surface quality in [0, 1]
    pub quality: Arc<dyn AttributeProvider<f64>>,
    /// Perceived safety in [0, 1]
    pub safety: Arc<dyn AttributeProvider<f64>>,
}

impl SegmentProviders {
    /// Coordinate-seeded heuristics; no network access.
    pub fn demo() -> Self {
        SegmentProviders {
            road_type: Arc::new(DemoRoadTypeProvider),
            traffic: Arc::new(DemoLevelProvider::traffic()),
            quality: Arc::new(DemoLevelProvider::quality()),
            safety: Arc::new(DemoLevelProvider::safety()),
        }
    }

    /// Every segment gets the same attributes.
    pub fn fixed(road_type: RoadType, traffic: f64, quality: f64, safety: f64) -> Self {
        SegmentProviders {
            road_type: Arc::new(StaticProvider::new(road_type)),
            traffic: Arc::new(StaticProvider::new(traffic)),
            quality: Arc::new(StaticProvider::new(quality)),
            safety: Arc::new(StaticProvider::new(safety)),
        }
    }

    pub fn with_road_type(mut self, provider: Arc<dyn AttributeProvider<RoadType>>) -> Self {
        self.road_type = provider;
        self
    }

    pub fn with_traffic(mut self, provider: Arc<dyn AttributeProvider<f64>>) -> Self {
        self.traffic = provider;
        self
    }

    pub fn with_quality(mut self, provider: Arc<dyn AttributeProvider<f64>>) -> Self {
        self.quality = provider;
        self
    }

    pub fn with_safety(mut self, provider: Arc<dyn AttributeProvider<f64>>) -> Self {
        self.safety = provider;
        self
    }
}

/// Returns the same value for every segment.
#[derive(Debug, Clone)]
pub struct StaticProvider<T> {
    value: T,
}

impl<T> StaticProvider<T> {
    pub fn new(value: T) -> Self {
        StaticProvider { value }
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> AttributeProvider<T> for StaticProvider<T> {
    async fn lookup(&self, _start: &RoutePoint, _end: &RoutePoint) -> Result<T> {
        Ok(self.value.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Road types the demo provider picks from. Pedestrian-only types are left
/// out so demo routes look like city streets.
const DEMO_ROAD_TYPES: [RoadType; 6] = [
    RoadType::Motorway,
    RoadType::Trunk,
    RoadType::Primary,
    RoadType::Secondary,
    RoadType::Tertiary,
    RoadType::Residential,
];

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a over the salt followed by each endpoint coordinate in
/// microdegrees (little-endian i64). Fixed across builds and toolchains.
fn segment_seed(start: &RoutePoint, end: &RoutePoint, salt: &str) -> u64 {
    let coordinates = [start.lat, start.lon, end.lat, end.lon]
        .into_iter()
        .flat_map(|value| ((value * 1e6).round() as i64).to_le_bytes());

    salt.bytes()
        .chain(coordinates)
        .fold(FNV_OFFSET_BASIS, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
        })
}

/// RNG seeded from the segment's endpoints and an attribute salt, so the same
/// segment always yields the same value.
fn segment_rng(start: &RoutePoint, end: &RoutePoint, salt: &str) -> StdRng {
    StdRng::seed_from_u64(segment_seed(start, end, salt))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DemoRoadTypeProvider;

#[async_trait]
impl AttributeProvider<RoadType> for DemoRoadTypeProvider {
    async fn lookup(&self, start: &RoutePoint, end: &RoutePoint) -> Result<RoadType> {
        let mut rng = segment_rng(start, end, "road_type");
        Ok(DEMO_ROAD_TYPES
            .choose(&mut rng)
            .copied()
            .unwrap_or(RoadType::DEFAULT))
    }

    fn name(&self) -> &'static str {
        "demo-road-type"
    }
}

/// Demo level in a fixed half-open range.
#[derive(Debug, Clone)]
pub struct DemoLevelProvider {
    name: &'static str,
    range: Range<f64>,
}

impl DemoLevelProvider {
    pub fn traffic() -> Self {
        DemoLevelProvider {
            name: "demo-traffic",
            range: 0.0..0.8,
        }
    }

    pub fn quality() -> Self {
        DemoLevelProvider {
            name: "demo-quality",
            range: 0.7..1.0,
        }
    }

    pub fn safety() -> Self {
        DemoLevelProvider {
            name: "demo-safety",
            range: 0.6..1.0,
        }
    }
}

#[async_trait]
impl AttributeProvider<f64> for DemoLevelProvider {
    async fn lookup(&self, start: &RoutePoint, end: &RoutePoint) -> Result<f64> {
        let mut rng = segment_rng(start, end, self.name);
        Ok(rng.random_range(self.range.clone()))
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
