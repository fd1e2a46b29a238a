// Location handling: coordinate parsing and great-circle distance
pub mod distance;
pub mod extractor;
pub mod models;

pub use distance::{calculate_distance, DistanceUnit, EARTH_RADIUS_KM, EARTH_RADIUS_MILES};
pub use extractor::{CoordinateExtractor, LocationSource, ParseFailure};
pub use models::{Coordinate, CoordinateError};
