use async_trait::async_trait;
use sqlx::PgPool;

use super::models::User;
use crate::domains::search::StoreError;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    async fn get(&self, id: i32) -> Result<Option<User>, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        Ok(User::find_all(&self.pool).await?)
    }

    async fn get(&self, id: i32) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(id, &self.pool).await?)
    }
}
