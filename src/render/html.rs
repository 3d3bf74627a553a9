use crate::domain::{DistanceUnit, Report, Segment};
use crate::extensions::date_time_ext::LocalDay;
use crate::extensions::duration_ext::HumanDuration;
use crate::render::Template;
use chrono::TimeZone;
use std::borrow::Cow;
use std::fmt::{Display, Write};

const FOOTER: &str = concat!("Generated by ", env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));
const NO_ACTIVITY: &str = "No activity recorded";

/// Builds the HTML document for a report. Output only depends on the arguments, so rendering the same report twice
/// yields identical bytes.
pub struct HtmlBuilder<'a, Tz: TimeZone> {
    buffer: String,
    template: &'a Template,
    units: DistanceUnit,
    timezone: &'a Tz,
}

impl<'a, Tz> HtmlBuilder<'a, Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    pub fn new(template: &'a Template, units: DistanceUnit, timezone: &'a Tz) -> Self {
        HtmlBuilder {
            buffer: String::with_capacity(8192),
            template,
            units,
            timezone,
        }
    }

    pub fn build(mut self, report: &Report) -> Result<String, std::fmt::Error> {
        self.write_head(report)?;
        writeln!(self.buffer, "<body>")?;
        writeln!(self.buffer, "<h1>{}</h1>", escape(&report.date.to_heading()))?;

        if report.is_empty() {
            writeln!(self.buffer, "<p class=\"empty\">{}</p>", NO_ACTIVITY)?;
        } else {
            self.write_summary(report)?;
            self.write_map(report)?;
            self.write_segments(&report.segments)?;
        }

        writeln!(self.buffer, "<footer>{}</footer>", escape(FOOTER))?;
        writeln!(self.buffer, "</body>")?;
        writeln!(self.buffer, "</html>")?;
        Ok(self.buffer)
    }

    fn write_head(&mut self, report: &Report) -> std::fmt::Result {
        writeln!(self.buffer, "<!DOCTYPE html>")?;
        writeln!(self.buffer, "<html>")?;
        writeln!(self.buffer, "<head>")?;
        writeln!(self.buffer, "<meta charset=\"utf-8\" />")?;
        writeln!(self.buffer, "<title>Whereabouts {}</title>", report.date.format("%Y-%m-%d"))?;
        writeln!(self.buffer, "<style>\n{}\n</style>", self.template.css())?;
        writeln!(self.buffer, "</head>")
    }

    fn write_summary(&mut self, report: &Report) -> std::fmt::Result {
        let mut rows = vec![
            ("Distance traveled", self.units.format_distance(report.total_distance_m)),
            ("Distance between places", self.units.format_distance(report.transit_distance_m)),
            ("Moving time", report.moving_time.to_human()),
            ("Time tracked", report.elapsed().to_human()),
            ("Places visited", report.place_count().to_string()),
        ];
        if let Some(speed) = report.max_speed_kmh {
            rows.push(("Top speed", self.units.format_speed(speed)));
        }

        writeln!(self.buffer, "<div id=\"summary\"><table>")?;
        for (name, value) in rows {
            writeln!(self.buffer, "<tr><th>{}</th><td>{}</td></tr>", name, escape(&value))?;
        }
        writeln!(self.buffer, "</table></div>")
    }

    fn write_map(&mut self, report: &Report) -> std::fmt::Result {
        let Some(map) = &report.map else {
            return Ok(());
        };

        writeln!(self.buffer, "<div id=\"map\">")?;
        writeln!(self.buffer, "<img src=\"{}\" width=\"620\" height=\"620\" alt=\"Map\" />", map.to_data_uri())?;
        writeln!(self.buffer, "</div>")
    }

    fn write_segments(&mut self, segments: &[Segment]) -> std::fmt::Result {
        writeln!(self.buffer, "<div id=\"data\"><table id=\"tdata\">")?;
        writeln!(
            self.buffer,
            "<tr id=\"head\"><th class=\"l\">Place</th><th class=\"l\">Arrived</th><th class=\"l\">Left</th>\
             <th class=\"l\">Duration</th><th class=\"l\">Distance</th><th>Points</th></tr>"
        )?;

        for (index, segment) in segments.iter().enumerate() {
            let mut classes = Vec::with_capacity(2);
            if index % 2 == 1 {
                classes.push("even");
            }
            if segment.label.placeholder {
                classes.push("placeholder");
            }
            let class_attribute = if classes.is_empty() { String::new() } else { format!(" class=\"{}\"", classes.join(" ")) };

            writeln!(
                self.buffer,
                "<tr{}><td class=\"l\">{}</td><td class=\"l\">{}</td><td class=\"l\">{}</td>\
                 <td class=\"l\">{}</td><td class=\"l\">{}</td><td>{}</td></tr>",
                class_attribute,
                escape(&segment.label.name),
                segment.start.with_timezone(self.timezone).format("%I:%M %p"),
                segment.end.with_timezone(self.timezone).format("%I:%M %p"),
                segment.duration().to_human(),
                self.units.format_distance(segment.distance_m),
                segment.waypoint_count,
            )?;
        }

        writeln!(self.buffer, "</table></div>")
    }
}

fn escape(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 16);
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}
