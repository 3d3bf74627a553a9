use crate::domain::{MapImage, Segment};
use chrono::{Duration, NaiveDate};

/// A full day of segments plus summary totals. Built once per run and handed to the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub date: NaiveDate,
    pub segments: Vec<Segment>,
    /// Sum of the distances within segments, in meters.
    pub total_distance_m: f64,
    /// Distance between the end of a segment and the start of the next one, in meters.
    pub transit_distance_m: f64,
    pub transit_time: Duration,
    pub moving_time: Duration,
    pub max_speed_kmh: Option<f64>,
    pub map: Option<MapImage>,
}

impl Report {
    /// Assembles a report, a segment counts as moving when it covers more than `moving_threshold_m`.
    pub fn new(date: NaiveDate, segments: Vec<Segment>, max_speed_kmh: Option<f64>, moving_threshold_m: f64) -> Self {
        let total_distance_m = segments.iter().map(|s| s.distance_m).sum();

        let mut transit_distance_m = 0.0;
        let mut transit_time = Duration::zero();
        for pair in segments.windows(2) {
            transit_distance_m += pair[0].last_location.distance_to(&pair[1].first_location);
            transit_time += pair[1].start - pair[0].end;
        }

        let moving_segments_time = segments
            .iter()
            .filter(|s| s.distance_m > moving_threshold_m)
            .fold(Duration::zero(), |acc, s| acc + s.duration());

        Report {
            date,
            segments,
            total_distance_m,
            transit_distance_m,
            transit_time,
            moving_time: transit_time + moving_segments_time,
            max_speed_kmh,
            map: None,
        }
    }

    pub fn empty(date: NaiveDate) -> Self {
        Report::new(date, Vec::new(), None, 0.0)
    }

    pub fn with_map(mut self, map: MapImage) -> Self {
        self.map = Some(map);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Time between the first and the last waypoint of the day.
    pub fn elapsed(&self) -> Duration {
        match (self.segments.first(), self.segments.last()) {
            (Some(first), Some(last)) => last.end - first.start,
            _ => Duration::zero(),
        }
    }

    /// Number of distinct places visited.
    pub fn place_count(&self) -> usize {
        let mut names = self.segments.iter().map(|s| s.label.name.as_str()).collect::<Vec<_>>();
        names.sort_unstable();
        names.dedup();
        names.len()
    }
}
