use crate::domain::{GeoLocation, MapImage};
use reqwest::{Client, StatusCode, header};
use thiserror::Error;
use tracing::{info, instrument};

// Keeps the request URL well below the 8192 character limit of the static maps API
const MAX_MARKERS: usize = 100;

/// Fetches a static map image with one marker per location. `map_url` carries the size and map type parameters.
#[instrument(skip_all, fields(locations = locations.len()))]
pub async fn fetch_static_map(client: &Client, map_url: &str, api_key: &str, locations: &[GeoLocation]) -> Result<MapImage, MapError> {
    info!("🗺️ Fetching map...");

    let markers = markers(locations);
    let response = client
        .get(map_url)
        .query(&[("markers", markers.as_str()), ("key", api_key)])
        .send()
        .await
        .map_err(|e| MapError::Unreachable(e.without_url()))?;

    if !response.status().is_success() {
        return Err(MapError::Status(response.status()));
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("image/png")
        .to_string();
    if !content_type.starts_with("image/") {
        return Err(MapError::NotAnImage(content_type));
    }

    let bytes = response.bytes().await.map_err(|e| MapError::Unreachable(e.without_url()))?;
    if bytes.is_empty() {
        return Err(MapError::Empty);
    }

    info!("🗺️ Fetching map... OK, {} bytes", bytes.len());
    Ok(MapImage {
        content_type,
        bytes: bytes.to_vec(),
    })
}

fn markers(locations: &[GeoLocation]) -> String {
    let mut points = locations
        .iter()
        .map(|location| format!("{:.4},{:.4}", location.latitude, location.longitude))
        .collect::<Vec<_>>();
    points.dedup();

    let step = points.len().div_ceil(MAX_MARKERS).max(1);
    points.iter().step_by(step).fold(String::new(), |mut acc, point| {
        acc.push('|');
        acc.push_str(point);
        acc
    })
}

#[derive(Error, Debug)]
pub enum MapError {
    #[error("map service unreachable: {0}")]
    Unreachable(reqwest::Error),
    #[error("map service responded with {0}")]
    Status(StatusCode),
    #[error("map service returned '{0}' instead of an image")]
    NotAnImage(String),
    #[error("map service returned an empty image")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use pretty_assertions::assert_eq;

    #[test]
    fn markers_are_deduplicated_and_rounded() {
        let locations = vec![
            GeoLocation::new(52.373_11, 4.892_21),
            GeoLocation::new(52.373_12, 4.892_22),
            GeoLocation::new(52.3784, 4.9009),
        ];

        assert_eq!(markers(&locations), "|52.3731,4.8922|52.3784,4.9009");
    }

    #[test]
    fn markers_are_capped() {
        let locations = (0..250).map(|i| GeoLocation::new(i as f64 * 0.01, 0.0)).collect::<Vec<_>>();

        assert!(markers(&locations).matches('|').count() <= MAX_MARKERS);
    }

    #[tokio::test]
    async fn fetch_static_map_returns_the_image() -> Result<(), MapError> {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/staticmap")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("size".into(), "620x620".into()),
                Matcher::UrlEncoded("markers".into(), "|52.3731,4.8922".into()),
                Matcher::UrlEncoded("key".into(), "geocode-key".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(b"\x89PNG")
            .create_async()
            .await;

        let url = format!("{}/staticmap?size=620x620", server.url());
        let map = fetch_static_map(&Client::new(), &url, "geocode-key", &[GeoLocation::new(52.3731, 4.8922)]).await?;

        mock.assert();
        assert_eq!(map.content_type, "image/png");
        assert_eq!(map.bytes, b"\x89PNG".to_vec());
        Ok(())
    }

    #[tokio::test]
    async fn fetch_static_map_rejects_non_images() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/staticmap")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html>quota exceeded</html>")
            .create_async()
            .await;

        let url = format!("{}/staticmap", server.url());
        let result = fetch_static_map(&Client::new(), &url, "key", &[GeoLocation::new(0.0, 0.0)]).await;

        assert!(matches!(result, Err(MapError::NotAnImage(_))), "got {:?}", result);
    }
}
