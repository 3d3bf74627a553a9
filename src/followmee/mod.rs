mod fetcher;
mod track_response;

pub use fetcher::{FetchError, fetch_waypoints};
