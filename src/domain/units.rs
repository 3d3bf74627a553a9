use serde::Deserialize;

const METERS_PER_MILE: f64 = 1_609.344;
const KMH_PER_MPH: f64 = 1.609_344;

/// Unit system used when presenting distances and speeds. Values are always stored in meters and km/h.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Metric,
    Imperial,
}

impl DistanceUnit {
    pub fn format_distance(&self, meters: f64) -> String {
        match self {
            DistanceUnit::Metric => format!("{:.2} km", meters / 1_000.0),
            DistanceUnit::Imperial => format!("{:.2} mi", meters / METERS_PER_MILE),
        }
    }

    /// Converts a speed in km/h into this unit system.
    pub fn speed(&self, kmh: f64) -> f64 {
        match self {
            DistanceUnit::Metric => kmh,
            DistanceUnit::Imperial => kmh / KMH_PER_MPH,
        }
    }

    pub fn speed_unit(&self) -> &'static str {
        match self {
            DistanceUnit::Metric => "km/h",
            DistanceUnit::Imperial => "mph",
        }
    }

    pub fn format_speed(&self, kmh: f64) -> String {
        format!("{:.0} {}", self.speed(kmh), self.speed_unit())
    }
}
