//! Backfill typed coordinates for regional centers
//!
//! Legacy center rows carry their location as free text with an embedded
//! `"(lat, lng)"` pair. This migration writes the pair into `latitude`,
//! `longitude` and the `location` geography so proximity search can rank the
//! row natively. Rows whose text yields no usable pair are skipped and keep
//! going through the request-time fallback.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info};

use super::{DataMigration, MigrationContext, MigrationResult, VerifyResult};
use crate::domains::locations::extractor::EMBEDDED_COORDINATE_PATTERN;
use crate::domains::locations::{Coordinate, CoordinateExtractor, ParseFailure};
use crate::domains::regional_centers::RegionalCenter;
use crate::domains::search::{AttributeFilters, Locatable};

pub struct NormalizeRegionalCenterCoordinatesMigration;

/// Coordinate to persist for a center, if one can be resolved
///
/// Typed columns win over the free-text pair.
pub fn resolve_target(center: &RegionalCenter) -> Result<Coordinate, ParseFailure> {
    CoordinateExtractor::extract(center.location_source())
}

/// Classify centers that still lack geometry
///
/// Centers with no embedded pair at all are out of scope. Those with a pair
/// that resolves are remaining work; those whose pair cannot be used are
/// reported as issues.
pub fn assess(centers: &[RegionalCenter]) -> VerifyResult {
    let mut remaining = 0i64;
    let mut issues = Vec::new();

    for center in centers {
        match resolve_target(center) {
            Ok(_) => remaining += 1,
            Err(ParseFailure::NotFound) => {}
            Err(failure) => issues.push(format!(
                "regional center {} ({}): {}",
                center.id, center.regional_center, failure
            )),
        }
    }

    if !issues.is_empty() {
        VerifyResult::Failed { issues }
    } else if remaining > 0 {
        VerifyResult::Incomplete { remaining }
    } else {
        VerifyResult::Passed
    }
}

#[async_trait]
impl DataMigration for NormalizeRegionalCenterCoordinatesMigration {
    fn name(&self) -> &'static str {
        "normalize_regional_center_coordinates"
    }

    fn description(&self) -> &'static str {
        "Copy embedded (lat, lng) pairs from location_coordinates into typed columns and geography"
    }

    async fn estimate(&self, db: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM regional_centers
            WHERE location IS NULL
              AND (
                (latitude IS NOT NULL AND longitude IS NOT NULL)
                OR location_coordinates ~ $1
              )
            "#,
        )
        .bind(EMBEDDED_COORDINATE_PATTERN)
        .fetch_one(db)
        .await?;
        Ok(count)
    }

    async fn find_work(&self, cursor: Option<i32>, limit: i64, db: &PgPool) -> Result<Vec<i32>> {
        let ids: Vec<i32> = sqlx::query_scalar(
            r#"
            SELECT id FROM regional_centers
            WHERE location IS NULL
              AND ($1::int IS NULL OR id > $1)
            ORDER BY id ASC
            LIMIT $2
            "#,
        )
        .bind(cursor)
        .bind(limit)
        .fetch_all(db)
        .await?;
        Ok(ids)
    }

    async fn execute_one(&self, id: i32, ctx: &MigrationContext) -> Result<MigrationResult> {
        let Some(center) = RegionalCenter::find_by_id(id, &ctx.db_pool).await? else {
            return Ok(skipped(ctx));
        };

        let coordinate = match resolve_target(&center) {
            Ok(coordinate) => coordinate,
            Err(failure) => {
                debug!(id, reason = %failure, "No usable coordinate");
                return Ok(skipped(ctx));
            }
        };

        if ctx.dry_run {
            return Ok(MigrationResult::WouldMigrate);
        }

        RegionalCenter::update_coordinates(id, coordinate, &ctx.db_pool).await?;
        info!(
            id,
            lat = coordinate.latitude,
            lng = coordinate.longitude,
            "Normalized regional center coordinates"
        );
        Ok(MigrationResult::Migrated)
    }

    async fn verify(&self, db: &PgPool) -> Result<VerifyResult> {
        let centers = RegionalCenter::find_without_geometry(&AttributeFilters::default(), db).await?;
        Ok(assess(&centers))
    }

    fn batch_size(&self) -> i64 {
        50
    }

    // Skips are expected; only database failures count against the budget
    fn error_budget(&self) -> f64 {
        0.05
    }
}

fn skipped(ctx: &MigrationContext) -> MigrationResult {
    if ctx.dry_run {
        MigrationResult::WouldSkip
    } else {
        MigrationResult::Skipped
    }
}
