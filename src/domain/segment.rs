use crate::domain::{GeoLocation, PlaceLabel, Waypoint};
use chrono::{DateTime, Duration, Utc};

/// A maximal run of consecutive waypoints resolved to the same place.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub label: PlaceLabel,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Haversine sum over consecutive waypoint pairs inside the segment, in meters.
    pub distance_m: f64,
    pub waypoint_count: usize,
    pub first_location: GeoLocation,
    pub last_location: GeoLocation,
}

impl Segment {
    pub fn open(label: PlaceLabel, waypoint: &Waypoint) -> Self {
        Segment {
            label,
            start: waypoint.timestamp,
            end: waypoint.timestamp,
            distance_m: 0.0,
            waypoint_count: 1,
            first_location: waypoint.location,
            last_location: waypoint.location,
        }
    }

    pub fn extend(&mut self, waypoint: &Waypoint) {
        self.distance_m += self.last_location.distance_to(&waypoint.location);
        self.end = waypoint.timestamp;
        self.last_location = waypoint.location;
        self.waypoint_count += 1;
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}
