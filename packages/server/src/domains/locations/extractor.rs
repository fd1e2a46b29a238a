//! Coordinate extraction from the location shapes found in stored rows.
//!
//! Rows carry their location in one of three ways: typed latitude/longitude
//! columns, a native geometry value decoded by the store, or (legacy data) a
//! `"(lat, lng)"` pair embedded somewhere in a free-text field. Everything is
//! reduced to a validated [`Coordinate`] or a [`ParseFailure`].

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use super::models::{Coordinate, CoordinateError};

/// Parenthesized pair of signed decimals, e.g. `(34.05, -118.25)`.
///
/// Written in the subset shared by the `regex` crate and PostgreSQL AREs so
/// SQL filters can match exactly the rows this module can parse.
pub const EMBEDDED_COORDINATE_PATTERN: &str =
    r"\(\s*([+-]?\d+(?:\.\d*)?)\s*,\s*([+-]?\d+(?:\.\d*)?)\s*\)";

lazy_static! {
    static ref EMBEDDED_COORDINATE_REGEX: Regex =
        Regex::new(EMBEDDED_COORDINATE_PATTERN).unwrap();
}

/// Where a record's location comes from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationSource<'a> {
    /// Typed columns, either of which may be missing
    Columns {
        latitude: Option<f64>,
        longitude: Option<f64>,
    },
    /// Native geometry already decoded to a numeric pair by the store
    Geometry { latitude: f64, longitude: f64 },
    /// Free text that may embed a `"(lat, lng)"` pair
    Text(&'a str),
}

/// Why a location could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("no coordinate pair found")]
    NotFound,

    #[error("coordinate pair is malformed")]
    Malformed,

    #[error("coordinate out of range: {0}")]
    OutOfRange(#[from] CoordinateError),
}

pub struct CoordinateExtractor;

impl CoordinateExtractor {
    pub fn extract(source: LocationSource<'_>) -> Result<Coordinate, ParseFailure> {
        match source {
            LocationSource::Columns {
                latitude: Some(latitude),
                longitude: Some(longitude),
            } => Ok(Coordinate::new(latitude, longitude)?),
            LocationSource::Columns {
                latitude: None,
                longitude: None,
            } => Err(ParseFailure::NotFound),
            // Only one of the pair is set
            LocationSource::Columns { .. } => Err(ParseFailure::Malformed),
            LocationSource::Geometry {
                latitude,
                longitude,
            } => Ok(Coordinate::new(latitude, longitude)?),
            LocationSource::Text(text) => Self::extract_from_text(text),
        }
    }

    /// Find the first `"(lat, lng)"` pair anywhere in `text`
    pub fn extract_from_text(text: &str) -> Result<Coordinate, ParseFailure> {
        let captures = EMBEDDED_COORDINATE_REGEX
            .captures(text)
            .ok_or(ParseFailure::NotFound)?;

        let latitude = parse_component(&captures[1])?;
        let longitude = parse_component(&captures[2])?;

        Ok(Coordinate::new(latitude, longitude)?)
    }
}

fn parse_component(raw: &str) -> Result<f64, ParseFailure> {
    let value: f64 = raw.parse().map_err(|_| ParseFailure::Malformed)?;
    if !value.is_finite() {
        return Err(ParseFailure::Malformed);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_embedded_pair_ignores_surrounding_text() {
        let coordinate =
            CoordinateExtractor::extract_from_text("123 Main St (34.0500, -118.2500), LA").unwrap();
        assert_eq!(coordinate.latitude, 34.05);
        assert_eq!(coordinate.longitude, -118.25);
    }

    #[test]
    fn test_first_match_wins() {
        let coordinate =
            CoordinateExtractor::extract_from_text("old (10, 20) new (30.5, 40.5)").unwrap();
        assert_eq!(coordinate, Coordinate::new(10.0, 20.0).unwrap());
    }

    #[test]
    fn test_accepts_sign_and_missing_fraction() {
        let coordinate = CoordinateExtractor::extract_from_text("(+34, -118.)").unwrap();
        assert_eq!(coordinate, Coordinate::new(34.0, -118.0).unwrap());

        let coordinate = CoordinateExtractor::extract_from_text("(34.1,-118.2)").unwrap();
        assert_eq!(coordinate, Coordinate::new(34.1, -118.2).unwrap());
    }

    #[test]
    fn test_no_pair_is_not_found() {
        assert_eq!(
            CoordinateExtractor::extract_from_text("4600 Main St, Los Angeles"),
            Err(ParseFailure::NotFound)
        );
        assert_eq!(
            CoordinateExtractor::extract_from_text("(north, west)"),
            Err(ParseFailure::NotFound)
        );
        assert_eq!(
            CoordinateExtractor::extract_from_text(""),
            Err(ParseFailure::NotFound)
        );
    }

    #[test]
    fn test_overflowing_number_is_malformed() {
        let text = format!("({}, 1.0)", "9".repeat(400));
        assert_eq!(
            CoordinateExtractor::extract_from_text(&text),
            Err(ParseFailure::Malformed)
        );
    }

    #[test]
    fn test_out_of_range_text_pair() {
        assert_eq!(
            CoordinateExtractor::extract_from_text("(123.0, 45.0)"),
            Err(ParseFailure::OutOfRange(CoordinateError::LatitudeOutOfRange))
        );
    }

    #[test]
    fn test_columns_pass_through_with_validation() {
        let source = LocationSource::Columns {
            latitude: Some(34.05),
            longitude: Some(-118.25),
        };
        assert_eq!(
            CoordinateExtractor::extract(source),
            Ok(Coordinate::new(34.05, -118.25).unwrap())
        );

        let source = LocationSource::Columns {
            latitude: Some(34.05),
            longitude: Some(-200.0),
        };
        assert_eq!(
            CoordinateExtractor::extract(source),
            Err(ParseFailure::OutOfRange(CoordinateError::LongitudeOutOfRange))
        );
    }

    #[test]
    fn test_columns_missing_or_partial() {
        let missing = LocationSource::Columns {
            latitude: None,
            longitude: None,
        };
        assert_eq!(
            CoordinateExtractor::extract(missing),
            Err(ParseFailure::NotFound)
        );

        let partial = LocationSource::Columns {
            latitude: Some(34.05),
            longitude: None,
        };
        assert_eq!(
            CoordinateExtractor::extract(partial),
            Err(ParseFailure::Malformed)
        );
    }

    #[test]
    fn test_geometry_is_range_checked() {
        let source = LocationSource::Geometry {
            latitude: -91.0,
            longitude: 0.0,
        };
        assert!(matches!(
            CoordinateExtractor::extract(source),
            Err(ParseFailure::OutOfRange(_))
        ));
    }
}
