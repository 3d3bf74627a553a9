use crate::domain::{CoordinateKey, PlaceLabel, Report, Segment, Waypoint};
use crate::resolver::PlaceResolver;
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{info, instrument};

/// Resolves the place of every waypoint and folds consecutive waypoints at the same place into segments. Each
/// rounded coordinate is resolved at most once per call, failures included.
#[instrument(skip_all, fields(waypoints = waypoints.len()))]
pub async fn segment_day(waypoints: &[Waypoint], resolver: &PlaceResolver) -> Vec<Segment> {
    info!("🧭 Resolving places for {} waypoint(s)...", waypoints.len());

    let mut labels: HashMap<CoordinateKey, PlaceLabel> = HashMap::new();
    let mut labelled = Vec::with_capacity(waypoints.len());
    for waypoint in waypoints {
        let key = resolver.key_for(&waypoint.location);
        let label = match labels.get(&key) {
            Some(label) => label.clone(),
            None => {
                let label = resolver.resolve_or_placeholder(&waypoint.location).await;
                labels.insert(key, label.clone());
                label
            }
        };
        labelled.push((waypoint, label));
    }

    let segments = build_segments(labelled);
    let stats = resolver.stats();
    info!(
        cache_hits = stats.hits,
        lookups = stats.lookups,
        "🧭 Resolving places... OK, {} segment(s) across {} location(s)",
        segments.len(),
        labels.len()
    );
    segments
}

/// Folds labelled waypoints, which must be ordered by timestamp, into segments.
pub fn build_segments<'a>(labelled: impl IntoIterator<Item = (&'a Waypoint, PlaceLabel)>) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    for (waypoint, label) in labelled {
        match segments.last_mut() {
            Some(current) if current.label.same_place(&label) => current.extend(waypoint),
            _ => segments.push(Segment::open(label, waypoint)),
        }
    }
    segments
}

/// Builds the day's report. Segments covering more than the tolerance radius count towards the moving time.
pub fn assemble_report(date: NaiveDate, waypoints: &[Waypoint], segments: Vec<Segment>, tolerance_m: f64) -> Report {
    let max_speed_kmh = waypoints
        .iter()
        .filter_map(|waypoint| waypoint.speed_kmh)
        .filter(|speed| speed.is_finite())
        .fold(None, |max: Option<f64>, speed| Some(max.map_or(speed, |max| max.max(speed))));

    Report::new(date, segments, max_speed_kmh, tolerance_m)
}
