use crate::pipeline::{Context, run};
use chrono::{DateTime, TimeZone, Utc};
use cron::Schedule;
use std::fmt::Display;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, instrument};

/// Runs the pipeline at every upcoming occurrence of `schedule` in `timezone`. Runs never overlap: a run that
/// outlasts the next occurrence causes that occurrence to be skipped.
#[instrument(skip_all)]
pub async fn serve<Tz>(context: &Context, schedule: &Schedule, timezone: &Tz)
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    info!("🕗 Scheduling report runs '{}'...", schedule);

    for datetime in schedule.upcoming(timezone.clone()) {
        let Some(delay) = delay_until(&datetime, Utc::now()) else {
            continue; // Already passed
        };

        debug!("🕗 Next run at {}", datetime);
        sleep_until(Instant::now() + delay).await;

        let date = context.config().report().day().date_at(Utc::now(), timezone);
        match run(context, date, timezone).await {
            Ok(path) => info!("🕗 Scheduled report for {} published to '{}'", date, path.display()),
            Err(e) => error!(category = e.category(), "🕗 Scheduled report for {} failed: {}", date, e),
        }
    }
}

fn delay_until<Tz: TimeZone>(datetime: &DateTime<Tz>, now: DateTime<Utc>) -> Option<Duration> {
    datetime.with_timezone(&Utc).signed_duration_since(now).to_std().ok()
}
