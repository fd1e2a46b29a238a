use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

/// User account - read-only here; accounts are managed by the identity provider
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user together with the capabilities their current token grants
#[derive(Serialize, Debug, Clone)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub permissions: Vec<String>,
}

impl User {
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, email, first_name, last_name, created_at, updated_at
             FROM users ORDER BY id ASC",
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: i32, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, email, first_name, last_name, created_at, updated_at
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }
}
