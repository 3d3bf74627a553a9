use crate::domain::GeoLocation;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

const METERS_PER_DEGREE_LATITUDE: f64 = 111_320.0;

// Keeps longitude cells finite close to the poles
const MIN_LONGITUDE_SCALE: f64 = 0.01;

/// Identifies a grid cell of roughly `tolerance_m` x `tolerance_m` meters. Coordinates that fall into the same cell
/// are treated as the same place when looking up cached labels.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct CoordinateKey {
    lat_cell: i64,
    lon_cell: i64,
}

impl CoordinateKey {
    pub fn from_location(location: &GeoLocation, tolerance_m: f64) -> Self {
        let lat_step = tolerance_m / METERS_PER_DEGREE_LATITUDE;
        let lat_cell = (location.latitude / lat_step).round() as i64;
        let lon_step = longitude_step(lat_cell, lat_step);
        let lon_cell = (location.longitude / lon_step).round() as i64;

        CoordinateKey { lat_cell, lon_cell }
    }
}

fn longitude_step(lat_cell: i64, lat_step: f64) -> f64 {
    let center_latitude = lat_cell as f64 * lat_step;
    lat_step / center_latitude.to_radians().cos().max(MIN_LONGITUDE_SCALE)
}

impl Display for CoordinateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.lat_cell, self.lon_cell)
    }
}

impl FromStr for CoordinateKey {
    type Err = ParseCoordinateKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s.split_once(':').ok_or_else(|| ParseCoordinateKeyError(s.to_string()))?;
        let lat_cell = lat.trim().parse().map_err(|_| ParseCoordinateKeyError(s.to_string()))?;
        let lon_cell = lon.trim().parse().map_err(|_| ParseCoordinateKeyError(s.to_string()))?;
        Ok(CoordinateKey { lat_cell, lon_cell })
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("invalid coordinate key '{0}', expected '<lat_cell>:<lon_cell>'")]
pub struct ParseCoordinateKeyError(String);
