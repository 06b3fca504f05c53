use crate::cache::{CacheStats, RouteCache};
use crate::error::{AppError, Result};
use crate::models::RouteGeometry;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// Key prefix shared by every entry this service writes, so `clear` never
/// touches foreign keys.
const KEY_PATTERN: &str = "route:direct:*";

/// Keys requested per `SCAN` round trip while clearing.
const SCAN_BATCH: usize = 500;

/// Redis-backed cache service. `ConnectionManager` is
/// `Arc`-based internally, so `.clone()` is a cheap atomic increment.
///
/// Unlike the in-memory backend there is no entry-count bound here: entries
/// leave Redis through their TTL (or the server's own `maxmemory` policy).
/// With a TTL of 0 routes are stored without expiry and stay until `clear`.
pub struct RedisCacheService {
    connection: ConnectionManager,
    route_cache_ttl: u64,
}

impl RedisCacheService {
    pub async fn new(redis_url: &str, route_cache_ttl: u64) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| AppError::Cache(format!("Failed to create Redis client: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Cache(format!("Failed to connect to Redis: {}", e)))?;

        tracing::info!("Redis cache connection established");
        if route_cache_ttl == 0 {
            tracing::warn!("ROUTE_CACHE_TTL is 0: Redis route entries will never expire");
        }

        Ok(RedisCacheService {
            connection,
            route_cache_ttl,
        })
    }
}

#[async_trait]
impl RouteCache for RedisCacheService {
    async fn get_route(&self, key: &str) -> Option<RouteGeometry> {
        let mut conn = self.connection.clone();
        let result: redis::RedisResult<Option<String>> = conn.get(key).await;

        match result {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(route) => {
                    tracing::debug!("Cache hit for route: {}", key);
                    Some(route)
                }
                Err(e) => {
                    tracing::warn!("Failed to deserialize cached route: {}", e);
                    None
                }
            },
            Ok(None) => {
                tracing::debug!("Cache miss for route: {}", key);
                None
            }
            Err(e) => {
                tracing::warn!("Redis error getting route: {}", e);
                None
            }
        }
    }

    async fn cache_route(&self, key: &str, route: &RouteGeometry) {
        let json = match serde_json::to_string(route) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!("Failed to serialize route for cache: {}", e);
                return;
            }
        };

        let mut conn = self.connection.clone();
        let result: redis::RedisResult<()> = set_command(key, &json, self.route_cache_ttl)
            .query_async(&mut conn)
            .await;

        match result {
            Ok(()) => {
                tracing::debug!(
                    "Cached route with TTL {}s: {}",
                    self.route_cache_ttl,
                    key
                );
            }
            Err(e) => {
                tracing::warn!("Failed to cache route: {}", e);
            }
        }
    }

    async fn clear(&self) {
        let mut conn = self.connection.clone();
        let mut cursor: u64 = 0;
        let mut removed_total: usize = 0;

        loop {
            let page: redis::RedisResult<(u64, Vec<String>)> =
                scan_command(cursor).query_async(&mut conn).await;
            let (next, keys) = match page {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!("Failed to scan cached routes: {}", e);
                    return;
                }
            };

            if !keys.is_empty() {
                let removed: redis::RedisResult<usize> = conn.del(&keys).await;
                match removed {
                    Ok(count) => removed_total += count,
                    Err(e) => {
                        tracing::warn!("Failed to clear Redis route cache: {}", e);
                        return;
                    }
                }
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        tracing::info!("Removed {} cached routes from Redis", removed_total);
    }

    async fn get_stats(&self) -> CacheStats {
        let mut conn = self.connection.clone();
        let info: redis::RedisResult<String> =
            redis::cmd("INFO").arg("stats").query_async(&mut conn).await;

        match info {
            Ok(info_str) => CacheStats::from_counts(
                parse_info_value(&info_str, "keyspace_hits"),
                parse_info_value(&info_str, "keyspace_misses"),
                None,
            ),
            Err(_) => CacheStats {
                hits: 0,
                misses: 0,
                hit_rate: 0.0,
                entries: None,
                connected: false,
            },
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.connection.clone();
        let result: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
        result.is_ok()
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

/// `SET key value`, with `EX ttl` only when a TTL is configured. Redis
/// rejects `SET ... EX 0`.
fn set_command(key: &str, json: &str, ttl_seconds: u64) -> redis::Cmd {
    let mut cmd = redis::cmd("SET");
    cmd.arg(key).arg(json);
    if ttl_seconds > 0 {
        cmd.arg("EX").arg(ttl_seconds);
    }
    cmd
}

/// One non-blocking `SCAN` page over this service's keys.
fn scan_command(cursor: u64) -> redis::Cmd {
    let mut cmd = redis::cmd("SCAN");
    cmd.arg(cursor)
        .arg("MATCH")
        .arg(KEY_PATTERN)
        .arg("COUNT")
        .arg(SCAN_BATCH);
    cmd
}

fn parse_info_value(info: &str, key: &str) -> u64 {
    info.lines()
        .find(|line| line.starts_with(key))
        .and_then(|line| line.split(':').nth(1))
        .and_then(|val| val.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(cmd: &redis::Cmd) -> String {
        String::from_utf8(cmd.get_packed_command()).unwrap()
    }

    #[test]
    fn test_set_command_with_ttl() {
        let wire = packed(&set_command("route:direct:a", "{}", 3600));
        assert!(wire.contains("\r\nSET\r\n"));
        assert!(wire.contains("\r\nEX\r\n"));
        assert!(wire.contains("\r\n3600\r\n"));
    }

    #[test]
    fn test_set_command_without_ttl_has_no_expiry() {
        let wire = packed(&set_command("route:direct:a", "{}", 0));
        assert!(wire.starts_with("*3\r\n"), "got {:?}", wire);
        assert!(!wire.contains("\r\nEX\r\n"));
    }

    #[test]
    fn test_clear_scans_instead_of_keys() {
        let wire = packed(&scan_command(17));
        assert!(wire.contains("\r\nSCAN\r\n"));
        assert!(wire.contains("\r\n17\r\n"));
        assert!(wire.contains(KEY_PATTERN));
        assert!(!wire.contains("\r\nKEYS\r\n"));
    }

    #[test]
    fn test_parse_info_value() {
        let info = "# Stats\r\nkeyspace_hits:42\r\nkeyspace_misses:8\r\n";
        assert_eq!(parse_info_value(info, "keyspace_hits"), 42);
        assert_eq!(parse_info_value(info, "keyspace_misses"), 8);
        assert_eq!(parse_info_value(info, "evicted_keys"), 0);
    }
}
