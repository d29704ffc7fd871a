pub mod age;
pub mod aggregator;
pub mod cache;
pub mod cast;
pub mod config;
pub mod enrich;
pub mod filmography;
pub mod gateway;
pub mod generation;
pub mod models;
pub mod suggest;
pub mod tmdb;

pub use age::compute_age;
pub use aggregator::Aggregator;
pub use cast::aggregate_cast;
pub use filmography::aggregate_filmography;
pub use gateway::{LookupError, LookupGateway};
pub use suggest::merge_suggestions;
