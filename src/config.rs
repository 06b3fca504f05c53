use crate::constants::*;
use crate::models::BoundingBox;
use std::env;

/// Where per-segment road types come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeBackend {
    /// Coordinate-seeded heuristics, no network access
    #[default]
    Demo,
    /// Road types from OpenStreetMap via Overpass; other attributes stay demo
    Overpass,
}

impl std::str::FromStr for AttributeBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "demo" => Ok(AttributeBackend::Demo),
            "overpass" => Ok(AttributeBackend::Overpass),
            _ => Err(format!(
                "Invalid attribute provider: {}. Use 'demo' or 'overpass'",
                s
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub osrm_base_url: String,
    pub geocoder: GeocoderConfig,
    pub redis_url: Option<String>,
    pub route_cache_ttl: u64,
    pub local_utc_offset_hours: i8,
    pub attribute_backend: AttributeBackend,
    pub router: RouterConfig,
}

#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
    pub limit: usize,
    /// Search window, `lon1,lat1,lon2,lat2`
    pub viewbox: Option<BoundingBox>,
    pub country_codes: Option<String>,
    pub query_suffix: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Relative distance change a detour needs to count as an alternative
    pub detour_min_difference: f64,

    /// Candidates requested when the client does not say
    pub default_max_alternatives: usize,

    /// Segments whose attributes are looked up at once
    pub segment_lookup_concurrency: usize,

    /// Capacity of the in-memory direct-route cache
    pub route_cache_max_entries: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            detour_min_difference: DEFAULT_DETOUR_MIN_DIFFERENCE,
            default_max_alternatives: DEFAULT_MAX_ALTERNATIVES,
            segment_lookup_concurrency: DEFAULT_SEGMENT_LOOKUP_CONCURRENCY,
            route_cache_max_entries: DEFAULT_ROUTE_CACHE_MAX_ENTRIES,
        }
    }
}

impl RouterConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let config = Self {
            detour_min_difference: env::var("ROUTE_DETOUR_MIN_DIFFERENCE")
                .unwrap_or_else(|_| defaults.detour_min_difference.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_DETOUR_MIN_DIFFERENCE")?,

            default_max_alternatives: env::var("ROUTE_DEFAULT_MAX_ALTERNATIVES")
                .unwrap_or_else(|_| defaults.default_max_alternatives.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_DEFAULT_MAX_ALTERNATIVES")?,

            segment_lookup_concurrency: env::var("SEGMENT_LOOKUP_CONCURRENCY")
                .unwrap_or_else(|_| defaults.segment_lookup_concurrency.to_string())
                .parse()
                .map_err(|_| "Invalid SEGMENT_LOOKUP_CONCURRENCY")?,

            route_cache_max_entries: env::var("ROUTE_CACHE_MAX_ENTRIES")
                .unwrap_or_else(|_| defaults.route_cache_max_entries.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_CACHE_MAX_ENTRIES")?,
        };

        if !(0.0..1.0).contains(&config.detour_min_difference) {
            return Err("ROUTE_DETOUR_MIN_DIFFERENCE must be in [0, 1)".to_string());
        }
        if !(1..=MAX_ALTERNATIVES_CLAMP).contains(&config.default_max_alternatives) {
            return Err(format!(
                "ROUTE_DEFAULT_MAX_ALTERNATIVES must be between 1 and {}",
                MAX_ALTERNATIVES_CLAMP
            ));
        }
        if config.segment_lookup_concurrency == 0 {
            return Err("SEGMENT_LOOKUP_CONCURRENCY must be at least 1".to_string());
        }

        Ok(config)
    }
}

impl GeocoderConfig {
    pub fn from_env() -> Result<Self, String> {
        let limit: usize = env::var("GEOCODER_LIMIT")
            .unwrap_or_else(|_| DEFAULT_GEOCODER_LIMIT.to_string())
            .parse()
            .map_err(|_| "Invalid GEOCODER_LIMIT")?;

        if limit == 0 || limit > MAX_GEOCODER_LIMIT {
            return Err(format!(
                "GEOCODER_LIMIT must be between 1 and {}",
                MAX_GEOCODER_LIMIT
            ));
        }

        Ok(GeocoderConfig {
            base_url: env::var("NOMINATIM_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_NOMINATIM_BASE_URL.to_string()),
            user_agent: env::var("NOMINATIM_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_NOMINATIM_USER_AGENT.to_string()),
            limit,
            viewbox: non_empty_var("GEOCODER_VIEWBOX")
                .map(|s| s.parse())
                .transpose()?,
            country_codes: non_empty_var("GEOCODER_COUNTRY_CODES"),
            query_suffix: non_empty_var("GEOCODER_QUERY_SUFFIX"),
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        let local_utc_offset_hours: i8 = env::var("LOCAL_UTC_OFFSET_HOURS")
            .unwrap_or_else(|_| DEFAULT_LOCAL_UTC_OFFSET_HOURS.to_string())
            .parse()
            .map_err(|_| "Invalid LOCAL_UTC_OFFSET_HOURS")?;

        if !(-12..=14).contains(&local_utc_offset_hours) {
            return Err("LOCAL_UTC_OFFSET_HOURS must be between -12 and 14".to_string());
        }

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| "Invalid PORT")?,
            osrm_base_url: env::var("OSRM_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OSRM_BASE_URL.to_string()),
            geocoder: GeocoderConfig::from_env()?,
            redis_url: non_empty_var("REDIS_URL"),
            route_cache_ttl: env::var("ROUTE_CACHE_TTL")
                .unwrap_or_else(|_| DEFAULT_ROUTE_CACHE_TTL_SECONDS.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_CACHE_TTL")?,
            local_utc_offset_hours,
            attribute_backend: env::var("ATTRIBUTE_PROVIDER")
                .unwrap_or_else(|_| "demo".to_string())
                .parse()?,
            router: RouterConfig::from_env()?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
