use crate::domain::{DistanceUnit, Segment, Waypoint};
use crate::render::RenderError;
use chrono::TimeZone;
use std::fmt::Display;
use std::iter;
use tracing::{debug, instrument};

/// Writes one row per waypoint along with the place it was resolved to. `segments` must have been built from
/// `waypoints`, their waypoint counts assign each waypoint its place.
#[instrument(skip_all, fields(waypoints = waypoints.len()))]
pub fn render_waypoint_csv<Tz>(
    waypoints: &[Waypoint],
    segments: &[Segment],
    units: DistanceUnit,
    timezone: &Tz,
) -> Result<Vec<u8>, RenderError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    let speed_header = format!("Speed ({})", units.speed_unit());
    writer.write_record(["Date", "Lat", "Lon", speed_header.as_str(), "Accuracy", "Type", "Address"])?;

    let places = segments
        .iter()
        .flat_map(|segment| iter::repeat_n(segment.label.name.as_str(), segment.waypoint_count));
    for (waypoint, place) in waypoints.iter().zip(places) {
        writer.write_record([
            waypoint.timestamp.with_timezone(timezone).format("%Y-%m-%d %I:%M:%S %p").to_string(),
            waypoint.location.latitude.to_string(),
            waypoint.location.longitude.to_string(),
            waypoint.speed_kmh.map(|kmh| format!("{:.0}", units.speed(kmh))).unwrap_or_default(),
            waypoint.accuracy_m.map(|accuracy| accuracy.to_string()).unwrap_or_default(),
            waypoint.fix_type.clone().unwrap_or_default(),
            place.to_string(),
        ])?;
    }

    let csv = writer.into_inner().map_err(|e| RenderError::Io(e.into_error()))?;
    debug!("Rendered {} waypoint row(s), {} bytes", waypoints.len(), csv.len());
    Ok(csv)
}
