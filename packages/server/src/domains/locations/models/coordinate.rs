use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Latitude/longitude pair in decimal degrees (WGS84)
///
/// Fields are public so request parameters can be carried unvalidated until
/// the search engine checks them; use [`Coordinate::new`] when the pair must
/// be valid on construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Range violation for a coordinate component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CoordinateError {
    #[error("latitude must be between -90 and 90")]
    LatitudeOutOfRange,

    #[error("longitude must be between -180 and 180")]
    LongitudeOutOfRange,
}

impl Coordinate {
    /// Build a coordinate, rejecting out-of-range or non-finite components
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        let coordinate = Self {
            latitude,
            longitude,
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    pub fn validate(&self) -> Result<(), CoordinateError> {
        validate_latitude(self.latitude)?;
        validate_longitude(self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

pub fn validate_latitude(latitude: f64) -> Result<(), CoordinateError> {
    // NaN fails the range check
    if (-90.0..=90.0).contains(&latitude) {
        Ok(())
    } else {
        Err(CoordinateError::LatitudeOutOfRange)
    }
}

pub fn validate_longitude(longitude: f64) -> Result<(), CoordinateError> {
    if (-180.0..=180.0).contains(&longitude) {
        Ok(())
    } else {
        Err(CoordinateError::LongitudeOutOfRange)
    }
}
