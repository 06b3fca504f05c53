use serde::{Deserialize, Serialize};

/// A WGS84 point. `lon` rather than `lng` to match OSRM/Nominatim naming.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RoutePoint {
    pub lat: f64,
    pub lon: f64,
}

impl RoutePoint {
    pub fn new(lat: f64, lon: f64) -> Result<Self, String> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(format!(
                "Invalid latitude: {} (must be between -90 and 90)",
                lat
            ));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(format!(
                "Invalid longitude: {} (must be between -180 and 180)",
                lon
            ));
        }
        Ok(RoutePoint { lat, lon })
    }

    /// Checks the invariants of [`RoutePoint::new`] on an already-built value
    /// (e.g. one that came in through serde).
    pub fn validate(&self) -> Result<(), String> {
        RoutePoint::new(self.lat, self.lon).map(|_| ())
    }

    /// Great-circle distance using the Haversine formula.
    /// Returns distance in meters.
    pub fn distance_to(&self, other: &RoutePoint) -> f64 {
        const EARTH_RADIUS_M: f64 = 6_371_000.0;

        let lat1_rad = self.lat.to_radians();
        let lat2_rad = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }

    /// Round coordinates to specified decimal places for caching
    pub fn round(&self, decimal_places: u32) -> Self {
        let multiplier = 10_f64.powi(decimal_places as i32);
        RoutePoint {
            lat: (self.lat * multiplier).round() / multiplier,
            lon: (self.lon * multiplier).round() / multiplier,
        }
    }

    /// Point halfway between `self` and `other` in lat/lon space.
    /// Good enough for the sub-kilometre spans of city routes.
    pub fn midpoint(&self, other: &RoutePoint) -> RoutePoint {
        RoutePoint {
            lat: self.lat + (other.lat - self.lat) * 0.5,
            lon: self.lon + (other.lon - self.lon) * 0.5,
        }
    }

    /// Shift by fixed degree deltas.
    pub fn offset(&self, delta_lat: f64, delta_lon: f64) -> RoutePoint {
        RoutePoint {
            lat: self.lat + delta_lat,
            lon: self.lon + delta_lon,
        }
    }
}

/// Geographic search window (Nominatim `viewbox` order: left, top, right, bottom).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn contains(&self, point: &RoutePoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lon..=self.max_lon).contains(&point.lon)
    }

    /// Nominatim `viewbox` parameter: `<x1>,<y1>,<x2>,<y2>`.
    pub fn to_viewbox(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lon, self.max_lat, self.max_lon, self.min_lat
        )
    }
}

impl std::str::FromStr for BoundingBox {
    type Err = String;

    /// Parses a viewbox string `lon1,lat1,lon2,lat2` in any corner order.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values: Vec<f64> = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| format!("Invalid bounding box: '{}'", s))?;

        if values.len() != 4 {
            return Err(format!(
                "Invalid bounding box: '{}' (expected 4 comma-separated numbers)",
                s
            ));
        }

        Ok(BoundingBox {
            min_lon: values[0].min(values[2]),
            min_lat: values[1].min(values[3]),
            max_lon: values[0].max(values[2]),
            max_lat: values[1].max(values[3]),
        })
    }
}
