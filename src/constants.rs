//! Stable application-wide constants.
//!
//! Values here are structural invariants, scoring coefficients, and default
//! fallbacks for env-var-based configuration. They should rarely change.
//! For tuning knobs that benefit from runtime experimentation, see
//! [`RouterConfig`](crate::config::RouterConfig) instead.

// --- Server defaults (used when HOST / PORT env vars are absent) ---

/// Default bind address for the HTTP server.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default port for the HTTP server.
pub const DEFAULT_PORT: &str = "3000";

// --- Upstream services ---

/// Public OSRM demo server.
pub const DEFAULT_OSRM_BASE_URL: &str = "https://router.project-osrm.org";
/// Public Nominatim instance.
pub const DEFAULT_NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";
/// Nominatim's usage policy rejects requests without an identifying User-Agent.
pub const DEFAULT_NOMINATIM_USER_AGENT: &str = "citystep/0.1";
/// Default number of geocoder results per query.
pub const DEFAULT_GEOCODER_LIMIT: usize = 5;
/// Upper bound for the `limit` parameter accepted by the geocode endpoint.
pub const MAX_GEOCODER_LIMIT: usize = 20;
/// Default local UTC offset (hours) used to derive the time-of-day modifier.
pub const DEFAULT_LOCAL_UTC_OFFSET_HOURS: i8 = 3;
/// Timeout applied to every upstream HTTP request.
pub const UPSTREAM_REQUEST_TIMEOUT_SECONDS: u64 = 15;
/// OSRM accepts at most this many coordinates on the public server.
pub const OSRM_MAX_COORDINATES: usize = 25;

// --- Route cache ---

/// Default direct-route cache TTL: 1 hour. Overridden by `ROUTE_CACHE_TTL`.
pub const DEFAULT_ROUTE_CACHE_TTL_SECONDS: u64 = 3_600;
/// Default bound on cached direct routes. Overridden by `ROUTE_CACHE_MAX_ENTRIES`.
pub const DEFAULT_ROUTE_CACHE_MAX_ENTRIES: u64 = 100;
/// Coordinates are rounded to this many decimals (~1 m) when building cache keys.
pub const CACHE_KEY_COORDINATE_DECIMALS: u32 = 5;

// --- Sessions ---

/// Idle sessions are forgotten after this many seconds.
pub const SESSION_IDLE_TTL_SECONDS: u64 = 1_800;
/// Maximum number of concurrently tracked client sessions.
pub const MAX_TRACKED_SESSIONS: u64 = 10_000;
/// Header carrying the client session id for last-request-wins builds.
pub const SESSION_HEADER: &str = "x-session-id";

// --- Segment analysis ---

/// Default number of segments whose attributes are looked up concurrently.
pub const DEFAULT_SEGMENT_LOOKUP_CONCURRENCY: usize = 16;
/// Neutral traffic level used when the traffic provider fails.
pub const NEUTRAL_TRAFFIC_LEVEL: f64 = 0.5;
/// Neutral road quality used when the quality provider fails.
pub const NEUTRAL_ROAD_QUALITY: f64 = 0.5;
/// Neutral safety score used when the safety provider fails.
pub const NEUTRAL_SAFETY_SCORE: f64 = 0.5;

// --- Priority scoring ---

/// Ecology bonus for car-free road types (pedestrian, footway, path).
pub const CAR_FREE_ECOLOGY_BONUS: f64 = 0.2;
/// Ecology is reduced by `traffic_level * this` (air pollution and noise).
pub const ECOLOGY_TRAFFIC_PENALTY: f64 = 0.3;
/// Comfort is reduced by `traffic_level * this`.
pub const COMFORT_TRAFFIC_PENALTY: f64 = 0.5;
/// Walking speed (km/h) that maps to a speed score of 1.0.
pub const REFERENCE_WALKING_SPEED_KMH: f64 = 5.0;

// --- Recommendation thresholds ---

pub const LOW_PRIORITY_THRESHOLD: f64 = 0.4;
pub const HIGH_TRAFFIC_THRESHOLD: f64 = 0.7;
pub const LOW_SAFETY_THRESHOLD: f64 = 0.6;
pub const EXCELLENT_ROUTE_THRESHOLD: f64 = 0.8;
/// Segments above this priority count as "high priority" in statistics.
pub const HIGH_PRIORITY_STAT_THRESHOLD: f64 = 0.7;

// --- Route selection objective ---

pub const ROUTE_PRIORITY_SCALE: f64 = 100.0;
pub const SAFETY_BONUS_WEIGHT: f64 = 20.0;
pub const TRAFFIC_PENALTY_WEIGHT: f64 = 30.0;
pub const ECOLOGY_BONUS_WEIGHT: f64 = 25.0;
/// Segments below this priority cost [`LOW_QUALITY_SEGMENT_PENALTY`] points each.
pub const LOW_QUALITY_SEGMENT_THRESHOLD: f64 = 0.3;
pub const LOW_QUALITY_SEGMENT_PENALTY: f64 = 5.0;
/// Segments above this priority earn [`HIGH_QUALITY_SEGMENT_BONUS`] points each.
pub const HIGH_QUALITY_SEGMENT_THRESHOLD: f64 = 0.8;
pub const HIGH_QUALITY_SEGMENT_BONUS: f64 = 3.0;

// --- Alternative generation ---

/// Default number of candidates requested per build (direct + detours).
pub const DEFAULT_MAX_ALTERNATIVES: usize = 3;
/// Hard upper bound on requested alternatives.
pub const MAX_ALTERNATIVES_CLAMP: usize = 7;
/// A detour must differ from the direct route by more than this fraction of
/// the direct distance to be kept.
pub const DEFAULT_DETOUR_MIN_DIFFERENCE: f64 = 0.1;
/// Offset (degrees, ~200 m) for cardinal detours.
pub const CARDINAL_DETOUR_OFFSET_DEG: f64 = 0.002;
/// Offset (degrees per axis, ~100 m) for diagonal detours.
pub const DIAGONAL_DETOUR_OFFSET_DEG: f64 = 0.001;

// --- Overpass (road type lookups) ---

pub const OVERPASS_QUERY_TIMEOUT_SECONDS: u64 = 25;
/// Radius (m) around a segment midpoint searched for highway ways.
pub const OVERPASS_HIGHWAY_SEARCH_RADIUS_M: u32 = 15;
/// Retries after the first attempt (3 attempts total).
pub const OVERPASS_RETRY_MAX_ATTEMPTS: usize = 2;
pub const OVERPASS_HTTP_TOO_MANY_REQUESTS: u16 = 429;
pub const OVERPASS_HTTP_GATEWAY_TIMEOUT: u16 = 504;
/// Decimals used to bucket segment midpoints (~10 m) in the road type cache.
pub const ROAD_TYPE_CACHE_DECIMALS: u32 = 4;
pub const ROAD_TYPE_CACHE_MAX_ENTRIES: u64 = 50_000;
