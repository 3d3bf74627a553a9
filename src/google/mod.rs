mod geocode_response;
mod geocoder;
mod static_map;

pub use geocoder::{Geocoder, GoogleGeocoder, ResolveError};
pub use static_map::fetch_static_map;
