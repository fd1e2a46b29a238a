//! Provider model
//!
//! Imported rows use 0 for coordinates nobody has geocoded yet, so a zero
//! latitude or longitude is read as missing.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::domains::locations::{Coordinate, CoordinateExtractor, LocationSource};
use crate::domains::search::{contains_ignore_case, like_pattern, AttributeFilters, Locatable};

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Provider {
    pub id: i32,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub coverage_areas: Option<String>,
    pub center_based_services: Option<String>,
    /// Comma-separated
    pub areas: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Response shape, with `areas` split into a list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderView {
    pub id: i32,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub coverage_areas: Option<String>,
    pub center_based_services: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub areas: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NearbyProvider {
    #[serde(flatten)]
    pub provider: ProviderView,
    pub distance_miles: f64,
}

#[derive(Debug, sqlx::FromRow)]
struct RankedProviderRow {
    #[sqlx(flatten)]
    provider: Provider,
    distance_meters: f64,
}

/// Split a comma-separated area list, trimming entries and dropping blanks
pub fn split_areas(areas: &str) -> Vec<String> {
    areas
        .split(',')
        .map(str::trim)
        .filter(|area| !area.is_empty())
        .map(String::from)
        .collect()
}

fn known(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

impl Provider {
    pub fn view(&self) -> ProviderView {
        let location = CoordinateExtractor::extract(self.location_source()).ok();
        ProviderView {
            id: self.id,
            name: self.name.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            coverage_areas: self.coverage_areas.clone(),
            center_based_services: self.center_based_services.clone(),
            latitude: location.map(|c| c.latitude),
            longitude: location.map(|c| c.longitude),
            areas: split_areas(self.areas.as_deref().unwrap_or_default()),
        }
    }

    /// What to send the geocoder: the address, or the name within Los Angeles
    pub fn geocoding_query(&self) -> String {
        match self.address.as_deref().map(str::trim) {
            Some(address) if !address.is_empty() => address.to_string(),
            _ => format!("{}, Los Angeles, CA", self.name.trim()),
        }
    }

    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        let providers = sqlx::query_as::<_, Self>("SELECT * FROM providers ORDER BY id ASC")
            .fetch_all(pool)
            .await?;
        Ok(providers)
    }

    pub async fn find_by_id(id: i32, pool: &PgPool) -> Result<Option<Self>> {
        let provider = sqlx::query_as::<_, Self>("SELECT * FROM providers WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(provider)
    }

    /// Providers with a `location` within `radius_meters`, nearest first
    pub async fn find_within_radius(
        origin: Coordinate,
        radius_meters: f64,
        area: Option<&str>,
        pool: &PgPool,
    ) -> Result<Vec<(Self, f64)>> {
        let rows = sqlx::query_as::<_, RankedProviderRow>(
            r#"
            SELECT p.*,
                   ST_Distance(
                       p.location,
                       ST_SetSRID(ST_MakePoint($2, $1), 4326)::geography,
                       false
                   ) AS distance_meters
            FROM providers p
            WHERE p.location IS NOT NULL
              AND ST_DWithin(
                      p.location,
                      ST_SetSRID(ST_MakePoint($2, $1), 4326)::geography,
                      $3,
                      false
                  )
              AND ($4::text IS NULL OR p.coverage_areas ILIKE $4 OR p.areas ILIKE $4)
            ORDER BY distance_meters ASC, p.id ASC
            "#,
        )
        .bind(origin.latitude)
        .bind(origin.longitude)
        .bind(radius_meters)
        .bind(like_pattern(area))
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.provider, row.distance_meters))
            .collect())
    }

    pub async fn find_without_geometry(area: Option<&str>, pool: &PgPool) -> Result<Vec<Self>> {
        let providers = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM providers
            WHERE location IS NULL
              AND ($1::text IS NULL OR coverage_areas ILIKE $1 OR areas ILIKE $1)
            ORDER BY id ASC
            "#,
        )
        .bind(like_pattern(area))
        .fetch_all(pool)
        .await?;
        Ok(providers)
    }

    /// Providers whose coordinates are missing or zero
    pub async fn find_missing_coordinates(pool: &PgPool) -> Result<Vec<Self>> {
        let providers = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM providers
            WHERE latitude IS NULL OR longitude IS NULL
               OR latitude = 0 OR longitude = 0
            ORDER BY id ASC
            "#,
        )
        .fetch_all(pool)
        .await?;
        Ok(providers)
    }

    pub async fn update_coordinates(id: i32, coordinate: Coordinate, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE providers SET
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
}

impl Locatable for Provider {
    fn location_source(&self) -> LocationSource<'_> {
        LocationSource::Columns {
            latitude: known(self.latitude),
            longitude: known(self.longitude),
        }
    }

    fn matches(&self, filters: &AttributeFilters) -> bool {
        let area = filters.area.as_deref();
        area.is_none()
            || contains_ignore_case(self.coverage_areas.as_deref(), area)
            || contains_ignore_case(self.areas.as_deref(), area)
    }
}
