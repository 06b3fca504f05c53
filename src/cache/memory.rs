use crate::cache::{CacheStats, RouteCache};
use crate::models::RouteGeometry;
use async_trait::async_trait;
use moka::future::Cache;
use moka::policy::EvictionPolicy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-memory cache backed by moka with bounded capacity and optional TTL.
/// Eviction is least-recently-used, so a fresh route is always admitted and
/// the stalest one makes room for it. All methods take `&self`.
pub struct MemoryCacheService {
    routes: Cache<String, Arc<RouteGeometry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryCacheService {
    /// `route_ttl_seconds == 0` disables expiry; entries then only leave the
    /// cache through capacity eviction.
    pub fn new(route_ttl_seconds: u64, max_capacity: u64) -> Self {
        let mut builder = Cache::builder()
            .max_capacity(max_capacity)
            .eviction_policy(EvictionPolicy::lru());
        if route_ttl_seconds > 0 {
            builder = builder.time_to_live(Duration::from_secs(route_ttl_seconds));
        }

        MemoryCacheService {
            routes: builder.build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl RouteCache for MemoryCacheService {
    async fn get_route(&self, key: &str) -> Option<RouteGeometry> {
        match self.routes.get(key).await {
            Some(route) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Memory cache hit for route: {}", key);
                Some((*route).clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Memory cache miss for route: {}", key);
                None
            }
        }
    }

    async fn cache_route(&self, key: &str, route: &RouteGeometry) {
        self.routes
            .insert(key.to_string(), Arc::new(route.clone()))
            .await;
        tracing::debug!(
            points = route.points.len(),
            "Memory cached route: {}",
            key
        );
    }

    async fn clear(&self) {
        self.routes.invalidate_all();
        self.routes.run_pending_tasks().await;
        tracing::info!("Memory route cache cleared");
    }

    async fn get_stats(&self) -> CacheStats {
        self.routes.run_pending_tasks().await;
        CacheStats::from_counts(
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            Some(self.routes.entry_count()),
        )
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
