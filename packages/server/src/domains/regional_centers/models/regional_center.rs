//! Regional center model - state-funded offices serving a county area
//!
//! Legacy rows keep their location only as free text (`location_coordinates`)
//! with an embedded `"(lat, lng)"` pair. The normalization migration copies
//! that pair into typed columns and the `location` geography.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::common::pagination::PageRequest;
use crate::domains::locations::{Coordinate, CoordinateExtractor, LocationSource};
use crate::domains::search::{contains_ignore_case, like_pattern, AttributeFilters, Locatable};

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct RegionalCenter {
    pub id: i32,
    pub regional_center: String,
    pub office_type: Option<String>,
    pub address: Option<String>,
    pub suite: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub telephone: Option<String>,
    pub website: Option<String>,
    pub county_served: Option<String>,
    pub los_angeles_health_district: Option<String>,
    pub location_coordinates: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing shape for map clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalCenterSummary {
    pub id: i32,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    #[serde(rename = "type")]
    pub office_type: Option<String>,
}

/// Nearest-center result; `distance` is in meters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestCenter {
    pub id: i32,
    pub name: String,
    pub distance: f64,
}

#[derive(Debug, sqlx::FromRow)]
struct RankedCenterRow {
    #[sqlx(flatten)]
    center: RegionalCenter,
    distance_meters: f64,
}

impl RegionalCenter {
    /// Street address, suite, then "city, state zip"
    pub fn full_address(&self) -> String {
        let mut full = self.address.clone().unwrap_or_default();
        if let Some(suite) = self.suite.as_deref().filter(|s| !s.trim().is_empty()) {
            full.push_str(", ");
            full.push_str(suite);
        }
        full.push_str(&format!(
            ", {}, {} {}",
            self.city.as_deref().unwrap_or_default(),
            self.state.as_deref().unwrap_or_default(),
            self.zip_code.as_deref().unwrap_or_default()
        ));
        full.trim().to_string()
    }

    /// Best-known location, or `None` if nothing resolves
    pub fn resolve_location(&self) -> Option<Coordinate> {
        CoordinateExtractor::extract(self.location_source()).ok()
    }

    pub fn summary(&self) -> RegionalCenterSummary {
        let location = self.resolve_location();
        RegionalCenterSummary {
            id: self.id,
            name: self.regional_center.clone(),
            latitude: location.map(|c| c.latitude),
            longitude: location.map(|c| c.longitude),
            address: self.full_address(),
            phone: self.telephone.clone(),
            website: self.website.clone(),
            office_type: self.office_type.clone(),
        }
    }

    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        let centers = sqlx::query_as::<_, Self>("SELECT * FROM regional_centers ORDER BY id ASC")
            .fetch_all(pool)
            .await?;
        Ok(centers)
    }

    pub async fn find_by_id(id: i32, pool: &PgPool) -> Result<Option<Self>> {
        let center = sqlx::query_as::<_, Self>("SELECT * FROM regional_centers WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(center)
    }

    /// One page of centers matching the text filters, plus the total match count
    pub async fn search(
        filters: &AttributeFilters,
        page: PageRequest,
        pool: &PgPool,
    ) -> Result<(Vec<Self>, i64)> {
        let county = like_pattern(filters.county.as_deref());
        let district = like_pattern(filters.district.as_deref());
        let city = like_pattern(filters.city.as_deref());
        let office_type = like_pattern(filters.office_type.as_deref());

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM regional_centers
            WHERE ($1::text IS NULL OR county_served ILIKE $1)
              AND ($2::text IS NULL OR los_angeles_health_district ILIKE $2)
              AND ($3::text IS NULL OR city ILIKE $3)
              AND ($4::text IS NULL OR office_type ILIKE $4)
            "#,
        )
        .bind(&county)
        .bind(&district)
        .bind(&city)
        .bind(&office_type)
        .fetch_one(pool)
        .await?;

        let centers = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM regional_centers
            WHERE ($1::text IS NULL OR county_served ILIKE $1)
              AND ($2::text IS NULL OR los_angeles_health_district ILIKE $2)
              AND ($3::text IS NULL OR city ILIKE $3)
              AND ($4::text IS NULL OR office_type ILIKE $4)
            ORDER BY id ASC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(&county)
        .bind(&district)
        .bind(&city)
        .bind(&office_type)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(pool)
        .await?;

        Ok((centers, total))
    }

    /// Centers with a `location` within `radius_meters`, nearest first
    pub async fn find_within_radius(
        origin: Coordinate,
        radius_meters: f64,
        filters: &AttributeFilters,
        pool: &PgPool,
    ) -> Result<Vec<(Self, f64)>> {
        let rows = sqlx::query_as::<_, RankedCenterRow>(
            r#"
            SELECT rc.*,
                   ST_Distance(
                       rc.location,
                       ST_SetSRID(ST_MakePoint($2, $1), 4326)::geography,
                       false
                   ) AS distance_meters
            FROM regional_centers rc
            WHERE rc.location IS NOT NULL
              AND ST_DWithin(
                      rc.location,
                      ST_SetSRID(ST_MakePoint($2, $1), 4326)::geography,
                      $3,
                      false
                  )
              AND ($4::text IS NULL OR rc.county_served ILIKE $4)
              AND ($5::text IS NULL OR rc.los_angeles_health_district ILIKE $5)
              AND ($6::text IS NULL OR rc.city ILIKE $6)
              AND ($7::text IS NULL OR rc.office_type ILIKE $7)
            ORDER BY distance_meters ASC, rc.id ASC
            "#,
        )
        .bind(origin.latitude)
        .bind(origin.longitude)
        .bind(radius_meters)
        .bind(like_pattern(filters.county.as_deref()))
        .bind(like_pattern(filters.district.as_deref()))
        .bind(like_pattern(filters.city.as_deref()))
        .bind(like_pattern(filters.office_type.as_deref()))
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.center, row.distance_meters))
            .collect())
    }

    /// Centers without a `location`, for in-process extraction
    pub async fn find_without_geometry(
        filters: &AttributeFilters,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let centers = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM regional_centers
            WHERE location IS NULL
              AND ($1::text IS NULL OR county_served ILIKE $1)
              AND ($2::text IS NULL OR los_angeles_health_district ILIKE $2)
              AND ($3::text IS NULL OR city ILIKE $3)
              AND ($4::text IS NULL OR office_type ILIKE $4)
            ORDER BY id ASC
            "#,
        )
        .bind(like_pattern(filters.county.as_deref()))
        .bind(like_pattern(filters.district.as_deref()))
        .bind(like_pattern(filters.city.as_deref()))
        .bind(like_pattern(filters.office_type.as_deref()))
        .fetch_all(pool)
        .await?;
        Ok(centers)
    }

    /// Write typed coordinates and the matching geography
    pub async fn update_coordinates(id: i32, coordinate: Coordinate, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE regional_centers SET
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

impl Locatable for RegionalCenter {
    fn location_source(&self) -> LocationSource<'_> {
        if self.latitude.is_some() || self.longitude.is_some() {
            LocationSource::Columns {
                latitude: self.latitude,
                longitude: self.longitude,
            }
        } else {
            LocationSource::Text(self.location_coordinates.as_deref().unwrap_or_default())
        }
    }

    fn matches(&self, filters: &AttributeFilters) -> bool {
        contains_ignore_case(self.county_served.as_deref(), filters.county.as_deref())
            && contains_ignore_case(
                self.los_angeles_health_district.as_deref(),
                filters.district.as_deref(),
            )
            && contains_ignore_case(self.city.as_deref(), filters.city.as_deref())
            && contains_ignore_case(self.office_type.as_deref(), filters.office_type.as_deref())
    }
}
