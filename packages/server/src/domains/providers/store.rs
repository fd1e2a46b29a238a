use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use super::models::Provider;
use crate::domains::locations::Coordinate;
use crate::domains::search::{AttributeFilters, ProximityStore, Ranked, StoreError};

/// Read access to providers
#[async_trait]
pub trait ProviderStore: ProximityStore<Provider> {
    async fn list(&self) -> Result<Vec<Provider>, StoreError>;

    async fn get(&self, id: i32) -> Result<Option<Provider>, StoreError>;
}

#[derive(Clone)]
pub struct PgProviderStore {
    pool: PgPool,
}

impl PgProviderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProximityStore<Provider> for PgProviderStore {
    #[instrument(skip(self, filters))]
    async fn find_within_radius(
        &self,
        origin: Coordinate,
        radius_meters: f64,
        filters: &AttributeFilters,
    ) -> Result<Vec<Ranked<Provider>>, StoreError> {
        let rows = Provider::find_within_radius(
            origin,
            radius_meters,
            filters.area.as_deref(),
            &self.pool,
        )
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
    ) -> Result<Vec<Provider>, StoreError> {
        Ok(Provider::find_without_geometry(filters.area.as_deref(), &self.pool).await?)
    }
}

#[async_trait]
impl ProviderStore for PgProviderStore {
    async fn list(&self) -> Result<Vec<Provider>, StoreError> {
        Ok(Provider::find_all(&self.pool).await?)
    }

    async fn get(&self, id: i32) -> Result<Option<Provider>, StoreError> {
        Ok(Provider::find_by_id(id, &self.pool).await?)
    }
}
