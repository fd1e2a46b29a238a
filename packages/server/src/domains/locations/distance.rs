use serde::{Deserialize, Serialize};

use super::models::Coordinate;

/// Mean Earth radius used by the spherical approximation
pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Unit a distance is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Miles,
    Kilometers,
    Meters,
}

impl DistanceUnit {
    /// How many of this unit make up one kilometer
    fn per_kilometer(self) -> f64 {
        match self {
            DistanceUnit::Miles => EARTH_RADIUS_MILES / EARTH_RADIUS_KM,
            DistanceUnit::Kilometers => 1.0,
            DistanceUnit::Meters => 1000.0,
        }
    }

    /// Convert `value` expressed in `self` into `target`
    pub fn convert(self, value: f64, target: DistanceUnit) -> f64 {
        if self == target {
            return value;
        }
        value / self.per_kilometer() * target.per_kilometer()
    }
}

/// Calculate the great-circle distance between two coordinates
///
/// Uses the Haversine formula on a spherical Earth. Deltas are taken as
/// absolute values so the result is bit-for-bit symmetric in its arguments.
pub fn calculate_distance(a: Coordinate, b: Coordinate, unit: DistanceUnit) -> f64 {
    let dlat = (b.latitude - a.latitude).abs().to_radians();
    let dlng = (b.longitude - a.longitude).abs().to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (dlng / 2.0).sin().powi(2);

    // Rounding can push h marginally past 1 for antipodal points
    let c = 2.0 * h.min(1.0).sqrt().asin();

    EARTH_RADIUS_KM * c * unit.per_kilometer()
}

impl Coordinate {
    pub fn distance_to(&self, other: &Coordinate, unit: DistanceUnit) -> f64 {
        calculate_distance(*self, *other, unit)
    }
}
