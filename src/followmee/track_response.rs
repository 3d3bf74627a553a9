use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

// API: https://www.followmee.com/api/tracks.aspx, function=daterangefordevice
#[derive(Debug, Deserialize)]
pub struct TrackResponse {
    #[serde(rename = "Data", default)]
    pub data: Option<Vec<TrackPoint>>,
    #[serde(rename = "Error", default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrackPoint {
    #[serde(rename = "Date")]
    pub date: DateTime<FixedOffset>,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
    #[serde(rename = "Type", default)]
    pub fix_type: Option<String>,
    #[serde(rename = "Speed(km/h)", default)]
    pub speed_kmh: Option<f64>,
    #[serde(rename = "Accuracy", default)]
    pub accuracy: Option<f64>,
}
