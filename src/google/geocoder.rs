use crate::app_config::Google;
use crate::domain::GeoLocation;
use crate::google::geocode_response::GeocodeResponse;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, instrument};

/// Reverse geocoding, turns a coordinate into a display name.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse_geocode(&self, location: &GeoLocation) -> Result<String, ResolveError>;
}

#[derive(Debug)]
pub struct GoogleGeocoder {
    client: Client,
    url: String,
    api_key: String,
    address_suffix: Option<String>,
}

impl GoogleGeocoder {
    pub fn new(client: Client, config: &Google) -> Self {
        GoogleGeocoder {
            client,
            url: config.geocode_url().to_string(),
            api_key: config.api_key().to_string(),
            address_suffix: config.address_suffix().map(str::to_string),
        }
    }

    fn display_name(&self, formatted_address: &str) -> String {
        let address = match &self.address_suffix {
            Some(suffix) => formatted_address.strip_suffix(suffix.as_str()).unwrap_or(formatted_address),
            None => formatted_address,
        };
        address.trim().to_string()
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    #[instrument(skip(self))]
    async fn reverse_geocode(&self, location: &GeoLocation) -> Result<String, ResolveError> {
        let latlng = format!("{:.6},{:.6}", location.latitude, location.longitude);
        let response = self
            .client
            .get(format!("{}/json", self.url))
            .query(&[("latlng", latlng.as_str()), ("key", self.api_key.as_str()), ("result_type", "street_address")])
            .send()
            .await
            .map_err(|e| ResolveError::Unreachable(e.without_url()))?;

        if !response.status().is_success() {
            return Err(ResolveError::Status(response.status()));
        }

        let body = response.text().await.map_err(|e| ResolveError::Unreachable(e.without_url()))?;
        let geocode_response = serde_json::from_str::<GeocodeResponse>(&body)?;

        match geocode_response.status.as_str() {
            "OK" => {
                let name = geocode_response
                    .results
                    .iter()
                    .filter_map(|result| result.formatted_address.as_deref())
                    .map(|address| self.display_name(address))
                    .find(|name| !name.is_empty())
                    .ok_or(ResolveError::NoResults)?;
                debug!(latlng, "Resolved '{}'", name);
                Ok(name)
            }
            "ZERO_RESULTS" => Err(ResolveError::NoResults),
            status => Err(ResolveError::Service {
                status: status.to_string(),
                message: geocode_response.error_message.unwrap_or_default(),
            }),
        }
    }
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("geocoding service unreachable: {0}")]
    Unreachable(reqwest::Error),
    #[error("geocoding service responded with {0}")]
    Status(StatusCode),
    #[error("geocoding service returned malformed data: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("no address found")]
    NoResults,
    #[error("geocoding service returned {status}: {message}")]
    Service { status: String, message: String },
}
