use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use super::models::RegionalCenter;
use crate::common::pagination::{Page, PageRequest};
use crate::domains::locations::Coordinate;
use crate::domains::search::{AttributeFilters, ProximityStore, Ranked, StoreError};

/// Read access to regional centers
#[async_trait]
pub trait RegionalCenterStore: ProximityStore<RegionalCenter> {
    async fn list(&self) -> Result<Vec<RegionalCenter>, StoreError>;

    async fn get(&self, id: i32) -> Result<Option<RegionalCenter>, StoreError>;

    /// Filtered page in id order; `total_count` is counted before pagination
    async fn search(
        &self,
        filters: &AttributeFilters,
        page: PageRequest,
    ) -> Result<Page<RegionalCenter>, StoreError>;
}

#[derive(Clone)]
pub struct PgRegionalCenterStore {
    pool: PgPool,
}

impl PgRegionalCenterStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProximityStore<RegionalCenter> for PgRegionalCenterStore {
    #[instrument(skip(self, filters))]
    async fn find_within_radius(
        &self,
        origin: Coordinate,
        radius_meters: f64,
        filters: &AttributeFilters,
    ) -> Result<Vec<Ranked<RegionalCenter>>, StoreError> {
        let rows =
            RegionalCenter::find_within_radius(origin, radius_meters, filters, &self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|(record, distance)| Ranked { record, distance })
            .collect())
    }

    #[instrument(skip(self, filters))]
    async fn find_without_geometry(
        &self,
        filters: &AttributeFilters,
    ) -> Result<Vec<RegionalCenter>, StoreError> {
        Ok(RegionalCenter::find_without_geometry(filters, &self.pool).await?)
    }
}

#[async_trait]
impl RegionalCenterStore for PgRegionalCenterStore {
    async fn list(&self) -> Result<Vec<RegionalCenter>, StoreError> {
        Ok(RegionalCenter::find_all(&self.pool).await?)
    }

    async fn get(&self, id: i32) -> Result<Option<RegionalCenter>, StoreError> {
        Ok(RegionalCenter::find_by_id(id, &self.pool).await?)
    }

    #[instrument(skip(self))]
    async fn search(
        &self,
        filters: &AttributeFilters,
        page: PageRequest,
    ) -> Result<Page<RegionalCenter>, StoreError> {
        let (centers, total) = RegionalCenter::search(filters, page, &self.pool).await?;
        Ok(Page::new(centers, page, total.max(0) as u64))
    }
}
