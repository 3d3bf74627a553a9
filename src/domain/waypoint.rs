use crate::domain::GeoLocation;
use chrono::{DateTime, Utc};

/// A single timestamped location sample as recorded by the tracking service.
#[derive(Clone, Debug, PartialEq)]
pub struct Waypoint {
    pub timestamp: DateTime<Utc>,
    pub location: GeoLocation,
    pub accuracy_m: Option<f64>,
    pub speed_kmh: Option<f64>,
    pub fix_type: Option<String>,
}

#[cfg(test)]
impl Waypoint {
    pub fn new(timestamp: DateTime<Utc>, latitude: f64, longitude: f64) -> Self {
        Waypoint {
            timestamp,
            location: GeoLocation::new(latitude, longitude),
            accuracy_m: None,
            speed_kmh: None,
            fix_type: None,
        }
    }
}
