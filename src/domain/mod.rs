mod coordinate_key;
mod geo_location;
mod map_image;
mod place_label;
mod report;
mod segment;
mod units;
mod waypoint;

pub use coordinate_key::CoordinateKey;
pub use geo_location::GeoLocation;
pub use map_image::MapImage;
pub use place_label::PlaceLabel;
pub use report::Report;
pub use segment::Segment;
pub use units::DistanceUnit;
pub use waypoint::Waypoint;
