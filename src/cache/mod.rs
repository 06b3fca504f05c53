mod memory;
mod redis;

pub use self::memory::MemoryCacheService;
pub use self::redis::RedisCacheService;

use crate::constants::CACHE_KEY_COORDINATE_DECIMALS;
use crate::models::{RouteGeometry, RouteProfile, RoutePoint};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Direct-route cache. Purely an optimisation: a miss, a failed write or an
/// unreachable backend only costs an extra router call.
#[async_trait]
pub trait RouteCache: Send + Sync {
    async fn get_route(&self, key: &str) -> Option<RouteGeometry>;
    async fn cache_route(&self, key: &str, route: &RouteGeometry);
    async fn clear(&self);
    async fn get_stats(&self) -> CacheStats;
    async fn health_check(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}

/// Cache key for a direct route between two points under one profile.
/// Coordinates are rounded to ~1 m so float noise does not defeat the cache.
pub fn direct_route_cache_key(from: &RoutePoint, to: &RoutePoint, profile: RouteProfile) -> String {
    let from = from.round(CACHE_KEY_COORDINATE_DECIMALS);
    let to = to.round(CACHE_KEY_COORDINATE_DECIMALS);
    format!(
        "route:direct:{}:{:.5},{:.5}-{:.5},{:.5}",
        profile, from.lat, from.lon, to.lat, to.lon
    )
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub entries: Option<u64>,
    pub connected: bool,
}

impl CacheStats {
    pub(crate) fn from_counts(hits: u64, misses: u64, entries: Option<u64>) -> Self {
        let hit_rate = if hits + misses > 0 {
            (hits as f64 / (hits + misses) as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            hits,
            misses,
            hit_rate,
            entries,
            connected: true,
        }
    }
}
