use crate::domain::{CoordinateKey, GeoLocation, PlaceLabel};
use crate::google::{Geocoder, ResolveError};
use crate::resolver::cache::{CacheError, PlaceCache};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, instrument, warn};

/// Resolves coordinates to place labels, consulting the cache before calling the geocoder.
pub struct PlaceResolver {
    geocoder: Box<dyn Geocoder>,
    cache: RwLock<PlaceCache>,
    tolerance_m: f64,
    placeholder: String,
    throttle: Duration,
    last_lookup: Mutex<Option<Instant>>,
    hits: AtomicUsize,
    lookups: AtomicUsize,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ResolverStats {
    pub hits: usize,
    pub lookups: usize,
}

impl PlaceResolver {
    pub fn new(geocoder: Box<dyn Geocoder>, cache: PlaceCache, placeholder: &str, throttle: Duration) -> Self {
        PlaceResolver {
            geocoder,
            tolerance_m: cache.tolerance_m(),
            cache: RwLock::new(cache),
            placeholder: placeholder.to_string(),
            throttle,
            last_lookup: Mutex::new(None),
            hits: AtomicUsize::new(0),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn key_for(&self, location: &GeoLocation) -> CoordinateKey {
        CoordinateKey::from_location(location, self.tolerance_m)
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, location: &GeoLocation) -> Result<PlaceLabel, ResolveError> {
        let key = self.key_for(location);
        if let Some(name) = self.cache.read().await.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(PlaceLabel::new(key, name));
        }

        self.wait_for_throttle().await;
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let name = self.geocoder.reverse_geocode(location).await?;

        self.cache.write().await.insert(key, name.clone());
        Ok(PlaceLabel::new(key, name))
    }

    /// Resolves the location, substituting the placeholder label when the geocoder fails.
    pub async fn resolve_or_placeholder(&self, location: &GeoLocation) -> PlaceLabel {
        match self.resolve(location).await {
            Ok(label) => label,
            Err(e) => {
                warn!(latitude = location.latitude, longitude = location.longitude, "⚠️ Unable to resolve place: {}", e);
                PlaceLabel::placeholder(self.key_for(location), self.placeholder.as_str())
            }
        }
    }

    pub async fn persist(&self, path: &Path) -> Result<(), CacheError> {
        let cache = self.cache.read().await;
        cache.save_to(path)?;
        debug!("Saved {} cached place(s) to '{}'", cache.len(), path.display());
        Ok(())
    }

    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            hits: self.hits.load(Ordering::Relaxed),
            lookups: self.lookups.load(Ordering::Relaxed),
        }
    }

    async fn wait_for_throttle(&self) {
        let mut last_lookup = self.last_lookup.lock().await;
        if let Some(previous) = *last_lookup {
            sleep_until(previous + self.throttle).await;
        }
        *last_lookup = Some(Instant::now());
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Geocoder answering from a fixed table, failing for unknown coordinates.
    #[derive(Default)]
    pub struct TableGeocoder {
        pub names: HashMap<String, String>,
        pub calls: Arc<AtomicUsize>,
    }

    impl TableGeocoder {
        pub fn with(mut self, location: GeoLocation, name: &str) -> Self {
            self.names.insert(Self::key(&location), name.to_string());
            self
        }

        fn key(location: &GeoLocation) -> String {
            format!("{:.4},{:.4}", location.latitude, location.longitude)
        }
    }

    #[async_trait]
    impl Geocoder for TableGeocoder {
        async fn reverse_geocode(&self, location: &GeoLocation) -> Result<String, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.names.get(&Self::key(location)).cloned().ok_or(ResolveError::NoResults)
        }
    }

    fn resolver(geocoder: TableGeocoder) -> PlaceResolver {
        PlaceResolver::new(Box::new(geocoder), PlaceCache::new(75.0), "Unknown location", Duration::ZERO)
    }

    #[tokio::test]
    async fn resolve_caches_nearby_coordinates() -> Result<(), ResolveError> {
        let geocoder = TableGeocoder::default().with(GeoLocation::new(52.3731, 4.8922), "Dam 1, Amsterdam");
        let calls = geocoder.calls.clone();
        let resolver = resolver(geocoder);

        let first = resolver.resolve(&GeoLocation::new(52.3731, 4.8922)).await?;
        let second = resolver.resolve(&GeoLocation::new(52.37311, 4.89221)).await?;

        assert_eq!(first, second);
        assert_eq!(first.name, "Dam 1, Amsterdam");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.stats(), ResolverStats { hits: 1, lookups: 1 });
        Ok(())
    }

    #[tokio::test]
    async fn resolve_propagates_geocoder_failures() {
        let resolver = resolver(TableGeocoder::default());

        let result = resolver.resolve(&GeoLocation::new(1.0, 1.0)).await;

        assert!(matches!(result, Err(ResolveError::NoResults)), "got {:?}", result);
    }

    #[tokio::test]
    async fn resolve_or_placeholder_substitutes_failures_without_caching_them() {
        let geocoder = TableGeocoder::default();
        let calls = geocoder.calls.clone();
        let resolver = resolver(geocoder);
        let location = GeoLocation::new(1.0, 1.0);

        let label = resolver.resolve_or_placeholder(&location).await;
        resolver.resolve_or_placeholder(&location).await;

        assert_eq!(label.name, "Unknown location");
        assert!(label.placeholder);
        assert_eq!(label.coordinate, CoordinateKey::from_location(&location, 75.0));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn key_for_uses_the_cache_tolerance() {
        let resolver = PlaceResolver::new(Box::new(TableGeocoder::default()), PlaceCache::new(500.0), "Unknown location", Duration::ZERO);
        let location = GeoLocation::new(52.3731, 4.8922);

        assert_eq!(resolver.key_for(&location), CoordinateKey::from_location(&location, 500.0));
        assert_ne!(resolver.key_for(&location), CoordinateKey::from_location(&location, 75.0));
    }

    #[tokio::test]
    async fn persist_writes_resolved_places() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("places.json");
        let location = GeoLocation::new(52.3731, 4.8922);
        let resolver = resolver(TableGeocoder::default().with(location, "Dam 1, Amsterdam"));

        resolver.resolve(&location).await?;
        resolver.persist(&path).await?;

        let cache = PlaceCache::read_from(&path, 75.0)?.expect("a cache file");
        assert_eq!(cache.get(&resolver.key_for(&location)), Some("Dam 1, Amsterdam"));
        Ok(())
    }

    #[tokio::test]
    async fn resolve_throttles_consecutive_lookups() -> Result<(), ResolveError> {
        let geocoder = TableGeocoder::default()
            .with(GeoLocation::new(10.0, 10.0), "A")
            .with(GeoLocation::new(20.0, 20.0), "B");
        let resolver = PlaceResolver::new(Box::new(geocoder), PlaceCache::new(75.0), "Unknown location", Duration::from_millis(200));

        let started = Instant::now();
        resolver.resolve(&GeoLocation::new(10.0, 10.0)).await?;
        resolver.resolve(&GeoLocation::new(20.0, 20.0)).await?;

        assert!(started.elapsed() >= Duration::from_millis(200));
        Ok(())
    }
}
