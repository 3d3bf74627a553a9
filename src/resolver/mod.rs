mod cache;
mod resolver;

pub use cache::PlaceCache;
pub use resolver::PlaceResolver;

#[cfg(test)]
pub use resolver::tests::TableGeocoder;
