use crate::domain::{DistanceUnit, Report};
use crate::render::html::HtmlBuilder;
use crate::render::{PdfConverter, Template};
use chrono::TimeZone;
use std::fmt::Display;
use std::io;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Renders the report to HTML using `template`, then converts it into a PDF document.
#[instrument(skip_all, fields(date = %report.date, template = template.name()))]
pub async fn render_report<Tz>(
    report: &Report,
    template: &Template,
    units: DistanceUnit,
    timezone: &Tz,
    converter: &dyn PdfConverter,
) -> Result<Vec<u8>, RenderError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    info!("🖨️ Rendering report...");
    let html = HtmlBuilder::new(template, units, timezone).build(report)?;
    debug!("Rendered {} bytes of HTML", html.len());
    let pdf = converter.convert(&html).await?;

    info!("🖨️ Rendering report... OK, {} bytes", pdf.len());
    Ok(pdf)
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("unable to render template: {0}")]
    Template(#[from] std::fmt::Error),
    #[error("unable to write waypoint CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("PDF converter '{binary}' is not available")]
    ConverterUnavailable { binary: String },
    #[error("PDF conversion failed with status {status:?}: {stderr}")]
    Conversion { status: Option<i32>, stderr: String },
    #[error("PDF converter did not produce a PDF document")]
    InvalidOutput,
    #[error("PDF conversion failed: {0}")]
    Io(#[from] io::Error),
}
