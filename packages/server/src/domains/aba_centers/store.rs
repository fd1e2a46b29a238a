use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use super::models::{AbaCenter, AbaCenterInput, AbaCenterSearch};
use crate::domains::search::StoreError;

/// Persistence for ABA centers
///
/// Inputs reaching `create` and `update` are already normalized.
#[async_trait]
pub trait AbaCenterStore: Send + Sync {
    async fn list(&self) -> Result<Vec<AbaCenter>, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<AbaCenter>, StoreError>;

    async fn search(&self, criteria: &AbaCenterSearch) -> Result<Vec<AbaCenter>, StoreError>;

    async fn create(&self, input: AbaCenterInput) -> Result<AbaCenter, StoreError>;

    async fn update(&self, id: Uuid, input: AbaCenterInput)
        -> Result<Option<AbaCenter>, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgAbaCenterStore {
    pool: PgPool,
}

impl PgAbaCenterStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AbaCenterStore for PgAbaCenterStore {
    async fn list(&self) -> Result<Vec<AbaCenter>, StoreError> {
        Ok(AbaCenter::find_all(&self.pool).await?)
    }

    async fn get(&self, id: Uuid) -> Result<Option<AbaCenter>, StoreError> {
        Ok(AbaCenter::find_by_id(id, &self.pool).await?)
    }

    #[instrument(skip(self))]
    async fn search(&self, criteria: &AbaCenterSearch) -> Result<Vec<AbaCenter>, StoreError> {
        Ok(AbaCenter::search(criteria, &self.pool).await?)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn create(&self, input: AbaCenterInput) -> Result<AbaCenter, StoreError> {
        Ok(AbaCenter::create(Uuid::new_v4(), &input, &self.pool).await?)
    }

    #[instrument(skip(self, input))]
    async fn update(
        &self,
        id: Uuid,
        input: AbaCenterInput,
    ) -> Result<Option<AbaCenter>, StoreError> {
        Ok(AbaCenter::update(id, &input, &self.pool).await?)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(AbaCenter::delete(id, &self.pool).await?)
    }
}
