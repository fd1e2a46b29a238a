//! Data migration framework for surgical database transformations
//!
//! Data migrations are different from schema migrations (sqlx):
//! - Schema migrations change the database structure
//! - Data migrations transform data within existing structures
//!
//! # Usage
//!
//! 1. Implement the `DataMigration` trait for your migration
//! 2. Register it in [`all_migrations`]
//! 3. Run via `directory_cli migrate run <name> [--dry-run]`
//!
//! Runs are resumable by construction: work is selected by a predicate the
//! migration itself clears, and batches are cursored by id.

pub mod normalize_regional_center_coordinates;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};

/// Result of executing a single item migration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationResult {
    /// Item was successfully migrated
    Migrated,
    /// Item was skipped (already migrated or not applicable)
    Skipped,
    /// Dry-run: item would have been migrated
    WouldMigrate,
    /// Dry-run: item would have been skipped
    WouldSkip,
}

/// Result of verification check
#[derive(Debug, PartialEq)]
pub enum VerifyResult {
    /// All items have been migrated
    Passed,
    /// Some items remain to be migrated
    Incomplete { remaining: i64 },
    /// Verification failed with issues
    Failed { issues: Vec<String> },
}

/// Context passed to migration execution
pub struct MigrationContext {
    /// Database connection pool
    pub db_pool: PgPool,
    /// Whether this is a dry-run (no mutations)
    pub dry_run: bool,
}

/// Trait for implementing data migrations
///
/// Each migration must be:
/// - Idempotent: running multiple times produces the same result
/// - Resumable: can continue from where it left off via cursor
/// - Verifiable: can check that migration completed correctly
#[async_trait]
pub trait DataMigration: Send + Sync + 'static {
    /// Unique name for this migration
    fn name(&self) -> &'static str;

    /// Optional description shown in migration list
    fn description(&self) -> &'static str {
        ""
    }

    /// Estimate total items to migrate
    async fn estimate(&self, db: &PgPool) -> Result<i64>;

    /// Find the next batch of items to migrate
    ///
    /// Must return ids in ascending order; the cursor is the last processed
    /// id (exclusive).
    async fn find_work(&self, cursor: Option<i32>, limit: i64, db: &PgPool) -> Result<Vec<i32>>;

    /// Execute migration for a single item
    async fn execute_one(&self, id: i32, ctx: &MigrationContext) -> Result<MigrationResult>;

    /// Verify that the migration is complete
    async fn verify(&self, db: &PgPool) -> Result<VerifyResult>;

    /// Batch size for processing items (default: 100)
    fn batch_size(&self) -> i64 {
        100
    }

    /// Maximum acceptable error rate before stopping (default: 1%)
    fn error_budget(&self) -> f64 {
        0.01
    }
}

/// Counters for one migration run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MigrationProgress {
    pub completed: i64,
    pub skipped: i64,
    pub failed: i64,
    pub last_processed_id: Option<i32>,
}

impl MigrationProgress {
    fn record(&mut self, id: i32, result: &Result<MigrationResult>) {
        match result {
            Ok(MigrationResult::Migrated | MigrationResult::WouldMigrate) => self.completed += 1,
            Ok(MigrationResult::Skipped | MigrationResult::WouldSkip) => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
        self.last_processed_id = Some(id);
    }

    /// Failures as a share of attempted items
    pub fn error_rate(&self) -> f64 {
        let total = self.completed + self.failed;
        if total == 0 {
            0.0
        } else {
            self.failed as f64 / total as f64
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub progress: MigrationProgress,
    /// The error budget was exceeded and the run stopped early
    pub aborted: bool,
}

/// Process every batch of work, reporting progress after each one
pub async fn run_migration<F>(
    migration: &dyn DataMigration,
    ctx: &MigrationContext,
    mut on_batch: F,
) -> Result<RunSummary>
where
    F: FnMut(&MigrationProgress),
{
    let mut progress = MigrationProgress::default();
    let batch_size = migration.batch_size();

    loop {
        let work = migration
            .find_work(progress.last_processed_id, batch_size, &ctx.db_pool)
            .await?;

        if work.is_empty() {
            break;
        }

        for id in work {
            let result = migration.execute_one(id, ctx).await;
            if let Err(e) = &result {
                warn!(migration = migration.name(), id, error = %e, "Item migration failed");
            }
            progress.record(id, &result);
        }

        on_batch(&progress);

        if progress.error_rate() > migration.error_budget() {
            warn!(
                migration = migration.name(),
                error_rate = progress.error_rate(),
                "Error budget exceeded"
            );
            return Ok(RunSummary {
                progress,
                aborted: true,
            });
        }
    }

    info!(
        migration = migration.name(),
        completed = progress.completed,
        skipped = progress.skipped,
        failed = progress.failed,
        dry_run = ctx.dry_run,
        "Migration run finished"
    );

    Ok(RunSummary {
        progress,
        aborted: false,
    })
}

/// Registry entry for a migration
pub struct MigrationEntry {
    pub migration: Box<dyn DataMigration>,
}

impl MigrationEntry {
    pub fn new<M: DataMigration>(m: M) -> Self {
        Self {
            migration: Box::new(m),
        }
    }
}

/// Get all registered migrations
///
/// Add new migrations to this function.
pub fn all_migrations() -> Vec<MigrationEntry> {
    vec![MigrationEntry::new(
        normalize_regional_center_coordinates::NormalizeRegionalCenterCoordinatesMigration,
    )]
}

/// Find a migration by name
pub fn find_migration(name: &str) -> Option<MigrationEntry> {
    all_migrations().into_iter().find(|e| e.migration.name() == name)
}
