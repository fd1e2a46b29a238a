use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use super::models::{Resource, ResourceInput};
use crate::domains::locations::Coordinate;
use crate::domains::search::{AttributeFilters, ProximityStore, Ranked, StoreError};

/// Persistence for resources
///
/// Inputs reaching `create` and `update` are already validated.
#[async_trait]
pub trait ResourceStore: ProximityStore<Resource> {
    async fn list(&self) -> Result<Vec<Resource>, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Resource>, StoreError>;

    async fn create(&self, input: ResourceInput) -> Result<Resource, StoreError>;

    async fn update(&self, id: &str, input: ResourceInput)
        -> Result<Option<Resource>, StoreError>;

    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

/// PostGIS-backed resource store
#[derive(Clone)]
pub struct PgResourceStore {
    pool: PgPool,
}

impl PgResourceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProximityStore<Resource> for PgResourceStore {
    #[instrument(skip(self, filters))]
    async fn find_within_radius(
        &self,
        origin: Coordinate,
        radius_meters: f64,
        filters: &AttributeFilters,
    ) -> Result<Vec<Ranked<Resource>>, StoreError> {
        let rows =
            Resource::find_within_radius(origin, radius_meters, &filters.diagnoses, &self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(record, distance)| Ranked { record, distance })
            .collect())
    }

    #[instrument(skip(self, filters))]
    async fn find_without_geometry(
        &self,
        filters: &AttributeFilters,
    ) -> Result<Vec<Resource>, StoreError> {
        Ok(Resource::find_without_geometry(&filters.diagnoses, &self.pool).await?)
    }
}

#[async_trait]
impl ResourceStore for PgResourceStore {
    async fn list(&self) -> Result<Vec<Resource>, StoreError> {
        Ok(Resource::find_all(&self.pool).await?)
    }

    async fn get(&self, id: &str) -> Result<Option<Resource>, StoreError> {
        Ok(Resource::find_by_id(id, &self.pool).await?)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn create(&self, input: ResourceInput) -> Result<Resource, StoreError> {
        let id = Resource::new_id();
        Ok(Resource::create(&id, &input, &self.pool).await?)
    }

    #[instrument(skip(self, input))]
    async fn update(
        &self,
        id: &str,
        input: ResourceInput,
    ) -> Result<Option<Resource>, StoreError> {
        Ok(Resource::update(id, &input, &self.pool).await?)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(Resource::delete(id, &self.pool).await?)
    }
}
