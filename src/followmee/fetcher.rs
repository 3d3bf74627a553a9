use crate::app_config::FollowMee;
use crate::domain::{GeoLocation, Waypoint};
use crate::extensions::date_time_ext::LocalDay;
use crate::followmee::track_response::{TrackPoint, TrackResponse};
use chrono::{Days, NaiveDate, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Fetches the waypoints recorded on the local calendar `date`, ordered by timestamp.
#[instrument(skip(client, config, timezone))]
pub async fn fetch_waypoints<Tz: TimeZone>(client: &Client, config: &FollowMee, date: NaiveDate, timezone: &Tz) -> Result<Vec<Waypoint>, FetchError> {
    info!("📡 Fetching waypoints for {}...", date);

    let (day_start, day_end) = date.local_day_bounds(timezone).ok_or(FetchError::InvalidDate(date))?;
    let next_day = date.checked_add_days(Days::new(1)).ok_or(FetchError::InvalidDate(date))?;
    let from = date.format("%Y-%m-%d").to_string();
    let to = next_day.format("%Y-%m-%d").to_string();

    let response = client
        .get(format!("{}/tracks.aspx", config.url()))
        .query(&[
            ("key", config.api_key()),
            ("username", config.username()),
            ("output", "json"),
            ("function", "daterangefordevice"),
            ("from", from.as_str()),
            ("to", to.as_str()),
            ("deviceid", config.device_id()),
        ])
        .send()
        .await
        .map_err(|e| FetchError::Unreachable(e.without_url()))?;

    let status = response.status();
    let body = response.text().await.map_err(|e| FetchError::Unreachable(e.without_url()))?;
    if !status.is_success() {
        return Err(FetchError::Status { status, body });
    }

    let track_response = serde_json::from_str::<TrackResponse>(&body)?;
    if let Some(message) = track_response.error {
        return Err(FetchError::Service(message));
    }

    let points = track_response.data.unwrap_or_default();
    let received = points.len();
    let mut waypoints = points
        .into_iter()
        .map(to_waypoint)
        .filter(|result| match result {
            Ok(waypoint) => waypoint.timestamp >= day_start && waypoint.timestamp < day_end,
            Err(_) => true,
        })
        .collect::<Result<Vec<_>, _>>()?;

    // The service does not guarantee any ordering
    waypoints.sort_by_key(|waypoint| waypoint.timestamp);

    if waypoints.len() < received {
        debug!("Dropped {} waypoint(s) outside of {}", received - waypoints.len(), date);
    }
    info!("📡 Fetching waypoints for {}... OK, {} found", date, waypoints.len());
    Ok(waypoints)
}

fn to_waypoint(point: TrackPoint) -> Result<Waypoint, FetchError> {
    let location = GeoLocation::new(point.latitude, point.longitude);
    if !location.is_valid() {
        return Err(FetchError::InvalidCoordinate {
            latitude: point.latitude,
            longitude: point.longitude,
        });
    }

    Ok(Waypoint {
        timestamp: point.date.with_timezone(&Utc),
        location,
        accuracy_m: point.accuracy,
        speed_kmh: point.speed_kmh,
        fix_type: point.fix_type,
    })
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("tracking service unreachable: {0}")]
    Unreachable(reqwest::Error),
    #[error("tracking service responded with {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("tracking service returned malformed data: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("tracking service returned an error: {0}")]
    Service(String),
    #[error("tracking service returned an invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
    #[error("unable to determine the time range of {0}")]
    InvalidDate(NaiveDate),
}
