// Persistence seam for proximity search
//
// Stores are infrastructure: they run queries and hand back rows. Ranking,
// fallback extraction and pagination stay in the engine.

use async_trait::async_trait;
use thiserror::Error;

use super::AttributeFilters;
use crate::domains::locations::{Coordinate, LocationSource};

/// The persistence collaborator failed
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Backend(anyhow::Error),
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<sqlx::Error>() {
            Ok(db) => StoreError::Database(db),
            Err(other) => StoreError::Backend(other),
        }
    }
}

/// A record paired with its distance from a search origin
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    pub record: T,
    pub distance: f64,
}

/// A record that can take part in proximity search
pub trait Locatable {
    /// Raw location used when the store cannot rank the record natively
    fn location_source(&self) -> LocationSource<'_>;

    /// Whether the record satisfies every filter that applies to it
    fn matches(&self, filters: &AttributeFilters) -> bool;
}

#[async_trait]
pub trait ProximityStore<T>: Send + Sync {
    /// Records with native geometry within `radius_meters` of `origin`,
    /// ranked by the store. Distances are in meters.
    async fn find_within_radius(
        &self,
        origin: Coordinate,
        radius_meters: f64,
        filters: &AttributeFilters,
    ) -> Result<Vec<Ranked<T>>, StoreError>;

    /// Records without native geometry, in scan order
    async fn find_without_geometry(&self, filters: &AttributeFilters)
        -> Result<Vec<T>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_errors_keep_their_database_cause() {
        let err = StoreError::from(anyhow::Error::from(sqlx::Error::RowNotFound));
        assert!(matches!(err, StoreError::Database(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn test_other_errors_stay_opaque() {
        let err = StoreError::from(anyhow::anyhow!("geocoder timed out"));
        assert!(matches!(err, StoreError::Backend(_)));
        assert_eq!(err.to_string(), "geocoder timed out");
    }
}
