use axum::Router;
use citystep::cache::{MemoryCacheService, RedisCacheService, RouteCache};
use citystep::config::{AttributeBackend, Config};
use citystep::models::RoutingConfig;
use citystep::services::{
    Geocoder, IntelligentRouter, NominatimClient, NominatimSettings, OsrmClient,
    OverpassRoadTypeProvider, RoadPriorityService, RouteProvider, SegmentProviders,
    SessionRegistry,
};
use citystep::AppState;
use std::sync::Arc;
use time::UtcOffset;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "citystep=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| format!("Failed to load configuration: {}", e))?;

    tracing::info!("Starting CityStep API server");
    tracing::info!("Configuration loaded successfully");

    // Initialize cache: try Redis, fall back to in-memory
    let cache: Arc<dyn RouteCache> = if let Some(ref redis_url) = config.redis_url {
        tracing::info!("Connecting to Redis cache...");
        match RedisCacheService::new(redis_url, config.route_cache_ttl).await {
            Ok(redis_cache) => {
                tracing::info!("Redis cache connection established");
                Arc::new(redis_cache)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to connect to Redis: {}. Falling back to in-memory cache.",
                    e
                );
                Arc::new(MemoryCacheService::new(
                    config.route_cache_ttl,
                    config.router.route_cache_max_entries,
                ))
            }
        }
    } else {
        tracing::info!("Redis URL not configured. Using in-memory cache.");
        Arc::new(MemoryCacheService::new(
            config.route_cache_ttl,
            config.router.route_cache_max_entries,
        ))
    };

    // Segment attribute providers
    let providers = match config.attribute_backend {
        AttributeBackend::Demo => {
            tracing::info!("Using demo segment attributes");
            SegmentProviders::demo()
        }
        AttributeBackend::Overpass => {
            tracing::info!("Using Overpass road types with demo traffic, quality and safety");
            SegmentProviders::demo().with_road_type(Arc::new(OverpassRoadTypeProvider::new()))
        }
    };

    let local_offset = UtcOffset::from_hms(config.local_utc_offset_hours, 0, 0)
        .map_err(|e| format!("Invalid local UTC offset: {}", e))?;

    // Initialize services
    let road_priority = Arc::new(
        RoadPriorityService::new(providers, RoutingConfig::default())
            .with_lookup_concurrency(config.router.segment_lookup_concurrency)
            .with_local_offset(local_offset),
    );

    let osrm: Arc<dyn RouteProvider> =
        Arc::new(OsrmClient::with_base_url(config.osrm_base_url.clone()));
    let router = Arc::new(
        IntelligentRouter::new(osrm, Arc::clone(&road_priority))
            .with_cache(Arc::clone(&cache))
            .with_detour_min_difference(config.router.detour_min_difference),
    );

    let geocoder: Arc<dyn Geocoder> = Arc::new(NominatimClient::new(NominatimSettings {
        base_url: config.geocoder.base_url.clone(),
        user_agent: config.geocoder.user_agent.clone(),
        limit: config.geocoder.limit,
        default_bounds: config.geocoder.viewbox,
        country_codes: config.geocoder.country_codes.clone(),
        query_suffix: config.geocoder.query_suffix.clone(),
    }));

    // Create application state
    let state = Arc::new(AppState {
        road_priority,
        router,
        geocoder,
        sessions: SessionRegistry::new(),
        cache: Some(cache),
        default_max_alternatives: config.router.default_max_alternatives,
    });

    // Build router with CORS and tracing
    let app = Router::new()
        .nest("/api/v1", citystep::routes::create_router(state))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        );

    // Start server
    let addr = config.server_address();
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
