use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};

pub trait LocalDay {
    /// Returns the UTC instants of local midnight on this date and on the following date in `timezone`.
    fn local_day_bounds<Tz: TimeZone>(&self, timezone: &Tz) -> Option<(DateTime<Utc>, DateTime<Utc>)>;

    /// Formats the date like "Aug 04, Friday, 2000".
    fn to_heading(&self) -> String;
}

impl LocalDay for NaiveDate {
    fn local_day_bounds<Tz: TimeZone>(&self, timezone: &Tz) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let next = self.checked_add_days(Days::new(1))?;
        let start = local_midnight(*self, timezone)?;
        let end = local_midnight(next, timezone)?;
        Some((start, end))
    }

    fn to_heading(&self) -> String {
        self.format("%b %d, %A, %Y").to_string()
    }
}

// Midnight can be skipped by a DST transition, in which case the earliest valid instant of the day is used
fn local_midnight<Tz: TimeZone>(date: NaiveDate, timezone: &Tz) -> Option<DateTime<Utc>> {
    (0..=2).find_map(|hour| {
        let naive = date.and_hms_opt(hour, 0, 0)?;
        timezone.from_local_datetime(&naive).earliest().map(|dt| dt.with_timezone(&Utc))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use pretty_assertions::assert_eq;

    #[test]
    fn local_day_bounds_in_utc() {
        let date = NaiveDate::from_ymd_opt(2000, 8, 4).unwrap();

        let (start, end) = date.local_day_bounds(&Utc).unwrap();

        assert_eq!(start, Utc.with_ymd_and_hms(2000, 8, 4, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2000, 8, 5, 0, 0, 0).unwrap());
    }

    #[test]
    fn local_day_bounds_with_an_offset() {
        let date = NaiveDate::from_ymd_opt(2000, 8, 4).unwrap();
        let pacific = FixedOffset::west_opt(7 * 3600).unwrap();

        let (start, end) = date.local_day_bounds(&pacific).unwrap();

        assert_eq!(start, Utc.with_ymd_and_hms(2000, 8, 4, 7, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2000, 8, 5, 7, 0, 0).unwrap());
    }

    #[test]
    fn to_heading_matches_the_report_title_format() {
        let date = NaiveDate::from_ymd_opt(2000, 8, 4).unwrap();
        assert_eq!(date.to_heading(), "Aug 04, Friday, 2000");
    }
}
