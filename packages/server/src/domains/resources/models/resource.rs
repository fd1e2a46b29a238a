//! Resource model - providers and services listed in the directory
//!
//! Each resource carries optional typed coordinates and, when both are set,
//! a PostGIS `location` geography kept in sync on every write.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::domains::locations::{Coordinate, CoordinateError, LocationSource};
use crate::domains::search::{AttributeFilters, Locatable};

/// Resource - a service or provider listed in the directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,

    // Absent until geocoded
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Sorted and deduplicated
    pub diagnoses: Vec<String>,
    pub contact_info: serde_json::Value,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A resource ranked by distance from a search origin
#[derive(Debug, Clone, Serialize)]
pub struct NearbyResource {
    #[serde(flatten)]
    pub resource: Resource,
    pub distance_miles: f64,
}

/// Resource row plus the distance computed by PostGIS
#[derive(Debug, sqlx::FromRow)]
struct RankedResourceRow {
    #[sqlx(flatten)]
    resource: Resource,
    distance_meters: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceValidationError {
    #[error("name is required")]
    NameRequired,

    #[error("latitude and longitude must be provided together")]
    IncompleteCoordinates,

    #[error(transparent)]
    InvalidCoordinate(#[from] CoordinateError),
}

/// Body of create and update requests
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub diagnoses: Vec<String>,
    #[serde(default)]
    pub contact_info: Option<serde_json::Value>,
}

impl ResourceInput {
    pub fn validate(&self) -> Result<(), ResourceValidationError> {
        if self.name.trim().is_empty() {
            return Err(ResourceValidationError::NameRequired);
        }

        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => {
                Coordinate::new(latitude, longitude)?;
                Ok(())
            }
            (None, None) => Ok(()),
            _ => Err(ResourceValidationError::IncompleteCoordinates),
        }
    }

    /// Validate and canonicalize: trimmed name, sorted unique diagnoses
    pub fn normalized(mut self) -> Result<Self, ResourceValidationError> {
        self.validate()?;
        self.name = self.name.trim().to_string();

        let mut diagnoses: Vec<String> = self
            .diagnoses
            .iter()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();
        diagnoses.sort();
        diagnoses.dedup();
        self.diagnoses = diagnoses;

        Ok(self)
    }

    fn contact_info(&self) -> serde_json::Value {
        self.contact_info
            .clone()
            .unwrap_or_else(|| serde_json::json!({}))
    }
}

impl Resource {
    /// Build an unsaved resource from validated input
    pub fn from_input(id: String, input: ResourceInput, now: DateTime<Utc>) -> Self {
        let contact_info = input.contact_info();
        Self {
            id,
            name: input.name,
            description: input.description,
            address: input.address,
            latitude: input.latitude,
            longitude: input.longitude,
            diagnoses: input.diagnoses,
            contact_info,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Find all resources, oldest first
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        let resources =
            sqlx::query_as::<_, Self>("SELECT * FROM resources ORDER BY created_at ASC, id ASC")
                .fetch_all(pool)
                .await?;
        Ok(resources)
    }

    pub async fn find_by_id(id: &str, pool: &PgPool) -> Result<Option<Self>> {
        let resource = sqlx::query_as::<_, Self>("SELECT * FROM resources WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(resource)
    }

    /// Resources with a `location` within `radius_meters` of the origin,
    /// nearest first, paired with their distance in meters
    pub async fn find_within_radius(
        origin: Coordinate,
        radius_meters: f64,
        diagnoses: &[String],
        pool: &PgPool,
    ) -> Result<Vec<(Self, f64)>> {
        let rows = sqlx::query_as::<_, RankedResourceRow>(
            r#"
            SELECT r.*,
                   ST_Distance(
                       r.location,
                       ST_SetSRID(ST_MakePoint($2, $1), 4326)::geography,
                       false
                   ) AS distance_meters
            FROM resources r
            WHERE r.location IS NOT NULL
              AND ST_DWithin(
                      r.location,
                      ST_SetSRID(ST_MakePoint($2, $1), 4326)::geography,
                      $3,
                      false
                  )
              AND (cardinality($4::text[]) = 0 OR r.diagnoses && $4::text[])
            ORDER BY distance_meters ASC, r.id ASC
            "#,
        )
        .bind(origin.latitude)
        .bind(origin.longitude)
        .bind(radius_meters)
        .bind(diagnoses)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.resource, row.distance_meters))
            .collect())
    }

    /// Resources the spatial index cannot rank
    pub async fn find_without_geometry(diagnoses: &[String], pool: &PgPool) -> Result<Vec<Self>> {
        let resources = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM resources
            WHERE location IS NULL
              AND (cardinality($1::text[]) = 0 OR diagnoses && $1::text[])
            ORDER BY id ASC
            "#,
        )
        .bind(diagnoses)
        .fetch_all(pool)
        .await?;
        Ok(resources)
    }

    /// Resources still waiting for coordinates
    pub async fn find_missing_coordinates(pool: &PgPool) -> Result<Vec<Self>> {
        let resources = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM resources
            WHERE (latitude IS NULL OR longitude IS NULL)
              AND address IS NOT NULL
              AND address <> ''
            ORDER BY id ASC
            "#,
        )
        .fetch_all(pool)
        .await?;
        Ok(resources)
    }

    /// Insert a resource; the caller validates the input first
    pub async fn create(id: &str, input: &ResourceInput, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO resources (
                id, name, description, address, latitude, longitude,
                diagnoses, contact_info, location
            )
            VALUES (
                $1, $2, $3, $4, $5::float8, $6::float8, $7, $8,
                CASE WHEN $5::float8 IS NULL OR $6::float8 IS NULL THEN NULL
                     ELSE ST_SetSRID(ST_MakePoint($6::float8, $5::float8), 4326)::geography
                END
            )
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.address)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(&input.diagnoses)
        .bind(input.contact_info())
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Replace a resource's fields; `None` when the id does not exist
    pub async fn update(id: &str, input: &ResourceInput, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE resources SET
                name = $2,
                description = $3,
                address = $4,
                latitude = $5::float8,
                longitude = $6::float8,
                diagnoses = $7,
                contact_info = $8,
                location = CASE WHEN $5::float8 IS NULL OR $6::float8 IS NULL THEN NULL
                                ELSE ST_SetSRID(ST_MakePoint($6::float8, $5::float8), 4326)::geography
                           END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.address)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(&input.diagnoses)
        .bind(input.contact_info())
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Set geocoded coordinates and the matching geography
    pub async fn update_coordinates(id: &str, coordinate: Coordinate, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE resources SET
                latitude = $2,
                longitude = $3,
                location = ST_SetSRID(ST_MakePoint($3, $2), 4326)::geography,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(coordinate.latitude)
        .bind(coordinate.longitude)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Delete a resource; false when nothing matched
    pub async fn delete(id: &str, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl Locatable for Resource {
    fn location_source(&self) -> LocationSource<'_> {
        if self.latitude.is_some() || self.longitude.is_some() {
            LocationSource::Columns {
                latitude: self.latitude,
                longitude: self.longitude,
            }
        } else {
            LocationSource::Text(self.address.as_deref().unwrap_or_default())
        }
    }

    fn matches(&self, filters: &AttributeFilters) -> bool {
        filters.matches_diagnoses(&self.diagnoses)
    }
}
