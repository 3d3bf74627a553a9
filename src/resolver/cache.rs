use crate::domain::CoordinateKey;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Display names keyed by rounded coordinate. Purely additive, entries never expire.
#[derive(Debug)]
pub struct PlaceCache {
    tolerance_m: f64,
    entries: HashMap<CoordinateKey, String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedPlaceCache {
    tolerance_m: f64,
    entries: BTreeMap<String, String>,
}

impl PlaceCache {
    pub fn new(tolerance_m: f64) -> Self {
        PlaceCache {
            tolerance_m,
            entries: HashMap::new(),
        }
    }

    pub fn tolerance_m(&self) -> f64 {
        self.tolerance_m
    }

    pub fn get(&self, key: &CoordinateKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: CoordinateKey, name: String) {
        self.entries.insert(key, name);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Loads the cache at `path`, falling back to an empty cache when the file is missing, unreadable or was written
    /// with a different tolerance.
    pub fn load(path: &Path, tolerance_m: f64) -> Self {
        match Self::read_from(path, tolerance_m) {
            Ok(Some(cache)) => {
                debug!("Loaded {} cached place(s) from '{}'", cache.len(), path.display());
                cache
            }
            Ok(None) => PlaceCache::new(tolerance_m),
            Err(e) => {
                warn!("⚠️ Ignoring place cache: {}", e);
                PlaceCache::new(tolerance_m)
            }
        }
    }

    pub fn read_from(path: &Path, tolerance_m: f64) -> Result<Option<Self>, CacheError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::Io { source: e, path: path.to_path_buf() }),
        };

        let persisted = serde_json::from_slice::<PersistedPlaceCache>(&bytes).map_err(|e| CacheError::Parse {
            source: e,
            path: path.to_path_buf(),
        })?;
        if persisted.tolerance_m != tolerance_m {
            return Err(CacheError::ToleranceMismatch {
                path: path.to_path_buf(),
                expected: tolerance_m,
                found: persisted.tolerance_m,
            });
        }

        let mut cache = PlaceCache::new(tolerance_m);
        for (key, name) in persisted.entries {
            match key.parse::<CoordinateKey>() {
                Ok(key) => cache.insert(key, name),
                Err(e) => warn!("⚠️ Skipping cached place: {}", e),
            }
        }
        Ok(Some(cache))
    }

    /// Writes the cache to a temporary file next to `path` and renames it into place, so concurrent readers never
    /// observe a partial file.
    pub fn save_to(&self, path: &Path) -> Result<(), CacheError> {
        let io_error = |source: io::Error| CacheError::Io { source, path: path.to_path_buf() };

        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(directory).map_err(io_error)?;

        let persisted = PersistedPlaceCache {
            tolerance_m: self.tolerance_m,
            entries: self.entries.iter().map(|(key, name)| (key.to_string(), name.clone())).collect(),
        };
        let json = serde_json::to_vec_pretty(&persisted).map_err(|e| CacheError::Parse {
            source: e,
            path: path.to_path_buf(),
        })?;

        let mut file = tempfile::NamedTempFile::new_in(directory).map_err(io_error)?;
        file.write_all(&json).map_err(io_error)?;
        file.persist(path).map_err(|e| io_error(e.error))?;
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("unable to access '{}': {}", path.display(), source)]
    Io { source: io::Error, path: PathBuf },
    #[error("unable to parse '{}': {}", path.display(), source)]
    Parse { source: serde_json::Error, path: PathBuf },
    #[error("'{}' was written with a tolerance of {found} m, expected {expected} m", path.display())]
    ToleranceMismatch { path: PathBuf, expected: f64, found: f64 },
}
