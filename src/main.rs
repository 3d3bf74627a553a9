use crate::app_config::AppConfig;
use crate::cli::{Cli, Command};
use crate::pipeline::Context;
use chrono::{Local, TimeZone, Utc};
use clap::Parser;
use std::fmt::Display;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};

mod app_config;
mod cli;
mod domain;
mod extensions;
mod followmee;
mod google;
mod http_client;
mod pipeline;
mod publisher;
mod render;
mod resolver;
mod scheduler;
mod segmenter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("🪵 Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!(category = "config", "❌ Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("✅  Loaded configuration");

    let context = match Context::new(config) {
        Ok(context) => context,
        Err(e) => {
            error!(category = "config", "❌ {}", e);
            return ExitCode::FAILURE;
        }
    };

    match context.config().report().timezone() {
        Some(timezone) => {
            info!("🕗 Reporting in {}", timezone);
            execute(&cli, &context, &timezone).await
        }
        None => execute(&cli, &context, &Local).await,
    }
}

async fn execute<Tz>(cli: &Cli, context: &Context, timezone: &Tz) -> ExitCode
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match cli.command.as_ref().unwrap_or(&Command::Run) {
        Command::Run => {
            let date = cli
                .date
                .unwrap_or_else(|| context.config().report().day().date_at(Utc::now(), timezone));

            match pipeline::run(context, date, timezone).await {
                Ok(path) => {
                    info!("🔥 Published report for {} to '{}'", date, path.display());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!(category = e.category(), "❌ Report for {} failed: {}", date, e);
                    ExitCode::FAILURE
                }
            }
        }
        Command::Serve => {
            let Some(schedule) = context.config().schedule() else {
                error!(category = "config", "❌ Serving requires a 'schedule' setting");
                return ExitCode::FAILURE;
            };
            if cli.date.is_some() {
                warn!("--date is ignored when serving");
            }

            info!("🔥 {} is up and running", env!("CARGO_PKG_NAME"));
            scheduler::serve(context, schedule, timezone).await;
            ExitCode::SUCCESS
        }
    }
}
