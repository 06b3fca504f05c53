pub mod intelligent_router;
pub mod nominatim;
pub mod osrm;
pub mod overpass;
pub mod providers;
pub mod road_priority;

pub use intelligent_router::{IntelligentRouter, RouteOptions, RouteSession, SessionRegistry};
pub use nominatim::{Geocoder, NominatimClient, NominatimSettings};
pub use osrm::{OsrmClient, RouteProvider};
pub use overpass::OverpassRoadTypeProvider;
pub use providers::{AttributeProvider, SegmentProviders, StaticProvider};
pub use road_priority::{PrioritizeOptions, RoadPriorityService};
