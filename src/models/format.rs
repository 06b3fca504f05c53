//! Display formatting for distances, durations and speeds.

/// Walking speeds above this (km/h) usually mean the upstream mixed up units.
const SUSPICIOUS_WALKING_SPEED_KMH: f64 = 10.0;

pub fn format_distance(distance_meters: f64) -> String {
    if !distance_meters.is_finite() || distance_meters <= 0.0 {
        return "unknown".to_string();
    }

    if distance_meters < 1000.0 {
        format!("{} m", distance_meters.round() as u64)
    } else {
        let km = distance_meters / 1000.0;
        if km < 10.0 {
            format!("{:.1} km", km)
        } else {
            format!("{} km", km.round() as u64)
        }
    }
}

pub fn format_duration(duration_seconds: f64) -> String {
    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return "unknown".to_string();
    }

    let minutes = (duration_seconds / 60.0).round() as u64;
    if minutes < 60 {
        return format!("{} min", minutes);
    }

    let hours = minutes / 60;
    let remaining_minutes = minutes % 60;
    if remaining_minutes == 0 {
        format!("{} h", hours)
    } else {
        format!("{} h {} min", hours, remaining_minutes)
    }
}

/// Average speed, or `None` when either input is missing.
pub fn format_speed(distance_meters: f64, duration_seconds: f64) -> Option<String> {
    if !(distance_meters > 0.0 && duration_seconds > 0.0) {
        return None;
    }

    let speed_kmh = (distance_meters / 1000.0) / (duration_seconds / 3600.0);
    if speed_kmh > SUSPICIOUS_WALKING_SPEED_KMH {
        tracing::debug!(
            speed_kmh = %format!("{:.1}", speed_kmh),
            distance_meters,
            duration_seconds,
            "Average speed looks high for a pedestrian route"
        );
    }

    Some(format!("{:.1} km/h", speed_kmh))
}
