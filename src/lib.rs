// Library exports for testing and reusability

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use error::{AppError, Result};

use cache::RouteCache;
use services::{Geocoder, IntelligentRouter, RoadPriorityService, SessionRegistry};
use std::sync::Arc;

// App state for sharing across the application
pub struct AppState {
    pub road_priority: Arc<RoadPriorityService>,
    pub router: Arc<IntelligentRouter>,
    pub geocoder: Arc<dyn Geocoder>,
    pub sessions: SessionRegistry,
    pub cache: Option<Arc<dyn RouteCache>>,
    pub default_max_alternatives: usize,
}
