use crate::domain::DistanceUnit;
use crate::render::Template;
use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use config::Config;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const ENV_PREFIX: &str = "WHEREABOUTS";

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    http: Http,
    followmee: FollowMee,
    google: Google,
    #[serde(default)]
    resolver: Resolver,
    report: Report,
    #[serde(default)]
    pdf: Pdf,
    #[serde(default, deserialize_with = "deserialize_schedule")]
    schedule: Option<cron::Schedule>,
}

impl AppConfig {
    /// Loads `name` (any supported format), an optional `<name>_local` override and `WHEREABOUTS__*` environment
    /// variables, then validates the result.
    pub fn load(name: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = Config::builder()
            .add_source(config::File::with_name(name).required(true))
            .add_source(config::File::with_name(&local_variant(name)).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require("followmee.url", &self.followmee.url)?;
        require("followmee.username", &self.followmee.username)?;
        require("followmee.api_key", &self.followmee.api_key)?;
        require("followmee.device_id", &self.followmee.device_id)?;
        require("google.geocode_url", &self.google.geocode_url)?;
        require("google.api_key", &self.google.api_key)?;
        require("report.output_dir", &self.report.output_dir.to_string_lossy())?;

        if !(self.resolver.tolerance_m.is_finite() && self.resolver.tolerance_m > 0.0) {
            return Err(ConfigError::Invalid {
                key: "resolver.tolerance_m",
                reason: format!("must be a positive number of meters, got {}", self.resolver.tolerance_m),
            });
        }

        if let Some(alias) = self.report.latest_alias() {
            if alias.contains(['/', '\\']) || alias == "." || alias == ".." {
                return Err(ConfigError::Invalid {
                    key: "report.latest_alias",
                    reason: format!("'{}' must be a plain file name", alias),
                });
            }
        }

        Ok(())
    }

    pub fn http(&self) -> &Http {
        &self.http
    }

    pub fn followmee(&self) -> &FollowMee {
        &self.followmee
    }

    pub fn google(&self) -> &Google {
        &self.google
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn pdf(&self) -> &Pdf {
        &self.pdf
    }

    pub fn schedule(&self) -> Option<&cron::Schedule> {
        self.schedule.as_ref()
    }
}

fn local_variant(name: &str) -> String {
    let path = Path::new(name);
    let stem = path.with_extension("");
    format!("{}_local", stem.to_string_lossy())
}

fn require(key: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing(key));
    }
    Ok(())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn deserialize_schedule<'de, D>(deserializer: D) -> Result<Option<cron::Schedule>, D::Error>
where
    D: Deserializer<'de>,
{
    let expression = Option::<String>::deserialize(deserializer)?;
    match expression.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(expression) => cron::Schedule::from_str(expression)
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid cron expression '{}': {}", expression, e))),
    }
}

#[derive(Debug, Deserialize)]
pub struct Http {
    #[serde(with = "humantime_serde", default = "default_timeout")]
    timeout: Duration,
}

impl Http {
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for Http {
    fn default() -> Self {
        Http { timeout: default_timeout() }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

#[derive(Debug, Deserialize)]
pub struct FollowMee {
    url: String,
    username: String,
    api_key: String,
    device_id: String,
}

impl FollowMee {
    pub fn url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}

#[derive(Debug, Deserialize)]
pub struct Google {
    geocode_url: String,
    api_key: String,
    #[serde(default)]
    map_url: Option<String>,
    #[serde(with = "humantime_serde", default = "default_throttle")]
    throttle: Duration,
    #[serde(default)]
    address_suffix: Option<String>,
}

impl Google {
    pub fn geocode_url(&self) -> &str {
        self.geocode_url.trim_end_matches('/')
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn map_url(&self) -> Option<&str> {
        non_empty(&self.map_url)
    }

    /// Minimum delay between two geocode requests.
    pub fn throttle(&self) -> Duration {
        self.throttle
    }

    pub fn address_suffix(&self) -> Option<&str> {
        self.address_suffix.as_deref().filter(|s| !s.is_empty())
    }
}

fn default_throttle() -> Duration {
    Duration::from_millis(200)
}

#[derive(Debug, Deserialize)]
pub struct Resolver {
    #[serde(default = "default_tolerance")]
    tolerance_m: f64,
    #[serde(default = "default_placeholder")]
    placeholder: String,
    #[serde(default)]
    cache_file: Option<String>,
}

impl Resolver {
    pub fn tolerance_m(&self) -> f64 {
        self.tolerance_m
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn cache_file(&self) -> Option<&Path> {
        non_empty(&self.cache_file).map(Path::new)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Resolver {
            tolerance_m: default_tolerance(),
            placeholder: default_placeholder(),
            cache_file: None,
        }
    }
}

fn default_tolerance() -> f64 {
    75.0
}

fn default_placeholder() -> String {
    "Unknown location".to_string()
}

#[derive(Debug, Deserialize)]
pub struct Report {
    output_dir: PathBuf,
    #[serde(default)]
    template: Template,
    #[serde(default)]
    day: ReportDay,
    #[serde(default)]
    units: DistanceUnit,
    #[serde(default)]
    latest_alias: Option<String>,
    #[serde(default = "default_create_output_dir")]
    create_output_dir: bool,
    #[serde(default)]
    extra_output_dirs: Vec<PathBuf>,
    #[serde(default)]
    timezone: Option<chrono_tz::Tz>,
}

impl Report {
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn day(&self) -> ReportDay {
        self.day
    }

    pub fn units(&self) -> DistanceUnit {
        self.units
    }

    pub fn latest_alias(&self) -> Option<&str> {
        non_empty(&self.latest_alias)
    }

    pub fn create_output_dir(&self) -> bool {
        self.create_output_dir
    }

    /// Directories receiving a copy of every published file, next to `output_dir`.
    pub fn extra_output_dirs(&self) -> &[PathBuf] {
        &self.extra_output_dirs
    }

    /// Zone deciding the report day and the times shown in reports, `None` for the zone of the host.
    pub fn timezone(&self) -> Option<chrono_tz::Tz> {
        self.timezone
    }
}

fn default_create_output_dir() -> bool {
    true
}

/// Which day a run reports on when no explicit date is given.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportDay {
    #[default]
    Today,
    Yesterday,
}

impl ReportDay {
    pub fn date_for(&self, today: NaiveDate) -> NaiveDate {
        match self {
            ReportDay::Today => today,
            ReportDay::Yesterday => today.checked_sub_days(Days::new(1)).unwrap_or(today),
        }
    }

    /// The day to report on at `now`, judged by the calendar of `timezone` rather than the one of the host.
    pub fn date_at<Tz: TimeZone>(&self, now: DateTime<Utc>, timezone: &Tz) -> NaiveDate {
        self.date_for(now.with_timezone(timezone).date_naive())
    }
}

#[derive(Debug, Deserialize)]
pub struct Pdf {
    #[serde(default = "default_pdf_binary")]
    binary: String,
}

impl Pdf {
    pub fn binary(&self) -> &str {
        &self.binary
    }
}

impl Default for Pdf {
    fn default() -> Self {
        Pdf { binary: default_pdf_binary() }
    }
}

fn default_pdf_binary() -> String {
    "wkhtmltopdf".to_string()
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unable to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("missing required setting '{0}'")]
    Missing(&'static str),
    #[error("invalid setting '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[cfg(test)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn new() -> Self {
        AppConfigBuilder {
            config: AppConfig {
                http: Http::default(),
                followmee: FollowMee {
                    url: "https://followmee.url/api".to_string(),
                    username: "user".to_string(),
                    api_key: "tracking-key".to_string(),
                    device_id: "12345".to_string(),
                },
                google: Google {
                    geocode_url: "https://google.url/geocode".to_string(),
                    api_key: "geocode-key".to_string(),
                    map_url: None,
                    throttle: Duration::ZERO,
                    address_suffix: None,
                },
                resolver: Resolver::default(),
                report: Report {
                    output_dir: PathBuf::from("reports"),
                    template: Template::Classic,
                    day: ReportDay::Today,
                    units: DistanceUnit::Metric,
                    latest_alias: None,
                    create_output_dir: true,
                    extra_output_dirs: Vec::new(),
                    timezone: None,
                },
                pdf: Pdf::default(),
                schedule: None,
            },
        }
    }

    pub fn followmee_url(mut self, url: String) -> Self {
        self.config.followmee.url = url;
        self
    }

    pub fn geocode_url(mut self, url: String) -> Self {
        self.config.google.geocode_url = url;
        self
    }

    pub fn map_url(mut self, url: String) -> Self {
        self.config.google.map_url = Some(url);
        self
    }

    pub fn address_suffix(mut self, suffix: &str) -> Self {
        self.config.google.address_suffix = Some(suffix.to_string());
        self
    }

    pub fn cache_file(mut self, path: &Path) -> Self {
        self.config.resolver.cache_file = Some(path.to_string_lossy().into_owned());
        self
    }

    pub fn output_dir(mut self, path: &Path) -> Self {
        self.config.report.output_dir = path.to_path_buf();
        self
    }

    pub fn latest_alias(mut self, alias: &str) -> Self {
        self.config.report.latest_alias = Some(alias.to_string());
        self
    }

    pub fn create_output_dir(mut self, create: bool) -> Self {
        self.config.report.create_output_dir = create;
        self
    }

    pub fn extra_output_dir(mut self, path: &Path) -> Self {
        self.config.report.extra_output_dirs.push(path.to_path_buf());
        self
    }

    pub fn timezone(mut self, timezone: chrono_tz::Tz) -> Self {
        self.config.report.timezone = Some(timezone);
        self
    }

    pub fn pdf_binary(mut self, binary: &str) -> Self {
        self.config.pdf.binary = binary.to_string();
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::io::Write;

    const FULL_CONFIG: &str = r#"
        schedule = "0 5 * * * *"

        [http]
        timeout = "10s"

        [followmee]
        url = "https://www.followmee.com/api/"
        username = "jane"
        api_key = "tracking"
        device_id = "42"

        [google]
        geocode_url = "https://maps.googleapis.com/maps/api/geocode"
        api_key = "geocode"
        throttle = "250ms"
        address_suffix = ", USA"

        [resolver]
        tolerance_m = 50.0
        cache_file = "tmp/cache.json"

        [report]
        output_dir = "reports"
        template = "compact"
        day = "yesterday"
        units = "imperial"
        latest_alias = "~Today.pdf"
        extra_output_dirs = ["mirror"]
        timezone = "America/New_York"
    "#;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_reads_all_sections() -> Result<(), ConfigError> {
        let file = write_config(FULL_CONFIG);

        let config = AppConfig::load(file.path().to_str().unwrap())?;

        assert_eq!(config.http().timeout(), Duration::from_secs(10));
        assert_eq!(config.followmee().url(), "https://www.followmee.com/api");
        assert_eq!(config.followmee().device_id(), "42");
        assert_eq!(config.google().throttle(), Duration::from_millis(250));
        assert_eq!(config.google().address_suffix(), Some(", USA"));
        assert_eq!(config.google().map_url(), None);
        assert_eq!(config.resolver().tolerance_m(), 50.0);
        assert_eq!(config.resolver().placeholder(), "Unknown location");
        assert_eq!(config.resolver().cache_file(), Some(Path::new("tmp/cache.json")));
        assert_eq!(config.report().template(), &Template::Compact);
        assert_eq!(config.report().day(), ReportDay::Yesterday);
        assert_eq!(config.report().units(), DistanceUnit::Imperial);
        assert_eq!(config.report().latest_alias(), Some("~Today.pdf"));
        assert!(config.report().create_output_dir());
        assert_eq!(config.report().extra_output_dirs(), &[PathBuf::from("mirror")]);
        assert_eq!(config.report().timezone(), Some(chrono_tz::America::New_York));
        assert_eq!(config.pdf().binary(), "wkhtmltopdf");
        assert!(config.schedule().is_some());

        Ok(())
    }

    #[test]
    fn load_defaults_to_the_host_timezone() -> Result<(), ConfigError> {
        let file = write_config(&FULL_CONFIG.replace("timezone = \"America/New_York\"", ""));

        let config = AppConfig::load(file.path().to_str().unwrap())?;

        assert_eq!(config.report().timezone(), None);
        Ok(())
    }

    #[test]
    fn load_fails_fast_on_a_missing_credential() {
        let file = write_config(&FULL_CONFIG.replace("api_key = \"tracking\"", "api_key = \"\""));

        let result = AppConfig::load(file.path().to_str().unwrap());

        assert!(matches!(result, Err(ConfigError::Missing("followmee.api_key"))), "got {:?}", result);
    }

    #[test]
    fn load_fails_on_a_missing_section() {
        let file = write_config(&FULL_CONFIG.replace("[report]\n        output_dir = \"reports\"", "[report]"));

        let result = AppConfig::load(file.path().to_str().unwrap());

        assert!(matches!(result, Err(ConfigError::Load(_))), "got {:?}", result);
    }

    #[rstest]
    #[case("schedule = \"0 5 * * * *\"", "schedule = \"every hour\"")]
    #[case("template = \"compact\"", "template = \"fancy\"")]
    #[case("units = \"imperial\"", "units = \"furlongs\"")]
    #[case("timezone = \"America/New_York\"", "timezone = \"Mars/Olympus_Mons\"")]
    fn load_rejects_invalid_values(#[case] from: &str, #[case] to: &str) {
        let file = write_config(&FULL_CONFIG.replace(from, to));

        let result = AppConfig::load(file.path().to_str().unwrap());

        assert!(matches!(result, Err(ConfigError::Load(_))), "got {:?}", result);
    }

    #[rstest]
    #[case("tolerance_m = 50.0", "tolerance_m = 0.0", "resolver.tolerance_m")]
    #[case("latest_alias = \"~Today.pdf\"", "latest_alias = \"../escape.pdf\"", "report.latest_alias")]
    fn load_rejects_out_of_range_values(#[case] from: &str, #[case] to: &str, #[case] expected_key: &str) {
        let file = write_config(&FULL_CONFIG.replace(from, to));

        match AppConfig::load(file.path().to_str().unwrap()) {
            Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected an invalid setting error, got {:?}", other),
        }
    }

    #[rstest]
    #[case(ReportDay::Today, "2024-03-01", "2024-03-01")]
    #[case(ReportDay::Yesterday, "2024-03-01", "2024-02-29")]
    #[case(ReportDay::Yesterday, "2025-01-01", "2024-12-31")]
    fn report_day_date_for(#[case] day: ReportDay, #[case] today: NaiveDate, #[case] expected: NaiveDate) {
        assert_eq!(day.date_for(today), expected);
    }

    #[rstest]
    #[case(ReportDay::Today, chrono_tz::America::New_York, "2000-08-04")]
    #[case(ReportDay::Yesterday, chrono_tz::America::New_York, "2000-08-03")]
    #[case(ReportDay::Today, chrono_tz::Europe::Amsterdam, "2000-08-05")]
    #[case(ReportDay::Today, chrono_tz::UTC, "2000-08-05")]
    fn report_day_date_at_follows_the_timezone(#[case] day: ReportDay, #[case] timezone: chrono_tz::Tz, #[case] expected: NaiveDate) {
        // Past midnight in UTC, still the evening before in New York
        let now = Utc.with_ymd_and_hms(2000, 8, 5, 2, 30, 0).unwrap();

        assert_eq!(day.date_at(now, &timezone), expected);
    }

    #[rstest]
    #[case("config", "config_local")]
    #[case("/etc/whereabouts/config.toml", "/etc/whereabouts/config_local")]
    fn local_variant_appends_the_suffix(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(local_variant(name), expected);
    }
}
