use crate::app_config::AppConfig;
use crate::domain::Report;
use crate::followmee::{FetchError, fetch_waypoints};
use crate::google::{Geocoder, GoogleGeocoder, fetch_static_map};
use crate::http_client::{HttpClientError, new_client};
use crate::publisher::{PublishError, Publisher};
use crate::render::{PdfConverter, RenderError, Wkhtmltopdf, render_report, render_waypoint_csv};
use crate::resolver::{PlaceCache, PlaceResolver};
use crate::segmenter::{assemble_report, segment_day};
use chrono::{NaiveDate, TimeZone};
use reqwest::Client;
use std::fmt::Display;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Everything a run needs, constructed once at startup and shared by consecutive runs.
pub struct Context {
    config: AppConfig,
    client: Client,
    resolver: PlaceResolver,
    converter: Box<dyn PdfConverter>,
    publisher: Publisher,
}

impl Context {
    pub fn new(config: AppConfig) -> Result<Self, HttpClientError> {
        let client = new_client(&config)?;
        let geocoder = GoogleGeocoder::new(client.clone(), config.google());
        let converter = Wkhtmltopdf::new(config.pdf().binary());
        Ok(Context::with_parts(config, client, Box::new(geocoder), Box::new(converter)))
    }

    pub fn with_parts(config: AppConfig, client: Client, geocoder: Box<dyn Geocoder>, converter: Box<dyn PdfConverter>) -> Self {
        let tolerance_m = config.resolver().tolerance_m();
        let cache = match config.resolver().cache_file() {
            Some(path) => PlaceCache::load(path, tolerance_m),
            None => PlaceCache::new(tolerance_m),
        };
        let resolver = PlaceResolver::new(geocoder, cache, config.resolver().placeholder(), config.google().throttle());
        let publisher = Publisher::new(config.report());

        Context {
            config,
            client,
            resolver,
            converter,
            publisher,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Generates and publishes the report for `date`: fetch, resolve and segment, render, publish. Nothing is published
/// unless every fatal step succeeds.
#[instrument(skip(context, timezone))]
pub async fn run<Tz>(context: &Context, date: NaiveDate, timezone: &Tz) -> Result<PathBuf, PipelineError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    info!("🚀 Generating report for {}...", date);
    let config = &context.config;

    let waypoints = fetch_waypoints(&context.client, config.followmee(), date, timezone).await?;
    let report = if waypoints.is_empty() {
        info!("No waypoints recorded on {}", date);
        Report::empty(date)
    } else {
        let segments = segment_day(&waypoints, &context.resolver).await;
        persist_cache(context).await;

        let report = assemble_report(date, &waypoints, segments, config.resolver().tolerance_m());
        attach_map(context, report).await
    };

    let csv = render_waypoint_csv(&waypoints, &report.segments, config.report().units(), timezone)?;
    let pdf = render_report(
        &report,
        config.report().template(),
        config.report().units(),
        timezone,
        context.converter.as_ref(),
    )
    .await?;
    let path = context.publisher.publish(date, &pdf, &csv).await?;

    info!("🚀 Generating report for {}... OK", date);
    Ok(path)
}

async fn persist_cache(context: &Context) {
    if let Some(path) = context.config.resolver().cache_file() {
        if let Err(e) = context.resolver.persist(path).await {
            warn!("⚠️ Unable to save the place cache: {}", e);
        }
    }
}

async fn attach_map(context: &Context, report: Report) -> Report {
    let Some(map_url) = context.config.google().map_url() else {
        return report;
    };

    let locations = report.segments.iter().map(|segment| segment.first_location).collect::<Vec<_>>();
    match fetch_static_map(&context.client, map_url, context.config.google().api_key(), &locations).await {
        Ok(map) => report.with_map(map),
        Err(e) => {
            warn!("⚠️ Unable to fetch the map, continuing without it: {}", e);
            report
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl PipelineError {
    pub fn category(&self) -> &'static str {
        match self {
            PipelineError::Fetch(_) => "fetch",
            PipelineError::Render(_) => "render",
            PipelineError::Publish(_) => "publish",
        }
    }
}
