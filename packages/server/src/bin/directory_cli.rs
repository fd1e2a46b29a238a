//! Operator CLI for the care directory
//!
//! Every command prints one JSON object per line so output can be piped into
//! other tooling.

use std::time::Duration;

use anyhow::{Context, Result};
use care_directory::common::utils::geocoding::geocode_address;
use care_directory::config::Config;
use care_directory::data_migrations::{
    all_migrations, find_migration, run_migration, MigrationContext, MigrationEntry,
    MigrationProgress, VerifyResult,
};
use care_directory::domains::auth::JwtService;
use care_directory::domains::providers::Provider;
use care_directory::domains::resources::Resource;
use clap::{Parser, Subcommand};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Nominatim allows one request per second
const GEOCODE_PACING: Duration = Duration::from_millis(1100);

#[derive(Parser)]
#[command(name = "directory_cli")]
#[command(about = "Care directory operator tasks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Data migrations
    Migrate {
        #[command(subcommand)]
        command: MigrateCommand,
    },

    /// Geocode resources that have an address but no coordinates
    GeocodeResources {
        #[arg(long)]
        dry_run: bool,
    },

    /// Geocode providers with missing or zero coordinates
    GeocodeProviders {
        #[arg(long)]
        dry_run: bool,
    },

    /// Mint a bearer token signed with the configured secret
    IssueToken {
        #[arg(long)]
        sub: i64,
        #[arg(long)]
        email: String,
        /// Capability to grant; repeat for several
        #[arg(long = "permission")]
        permissions: Vec<String>,
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },
}

#[derive(Subcommand)]
enum MigrateCommand {
    /// List all registered migrations
    List,

    /// Estimate items to migrate
    Estimate { name: String },

    /// Run a migration to completion
    Run {
        name: String,
        #[arg(long)]
        dry_run: bool,
    },

    /// Verify migration completion
    Verify { name: String },
}

// ============================================================================
// JSON Response Types
// ============================================================================

#[derive(Serialize, Default)]
struct Response {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    migrations: Option<Vec<MigrationInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    progress: Option<MigrationProgress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    issues: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

impl Response {
    fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Default::default()
        }
    }
}

#[derive(Serialize)]
struct MigrationInfo {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

#[derive(Serialize)]
struct ProgressUpdate<'a> {
    #[serde(rename = "type")]
    update_type: &'static str,
    #[serde(flatten)]
    progress: Option<&'a MigrationProgress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

fn output<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,care_directory=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate { command } => match command {
            MigrateCommand::List => cmd_list(),
            MigrateCommand::Estimate { name } => cmd_estimate(&name).await,
            MigrateCommand::Run { name, dry_run } => cmd_run(&name, dry_run).await,
            MigrateCommand::Verify { name } => cmd_verify(&name).await,
        },
        Commands::GeocodeResources { dry_run } => cmd_geocode_resources(dry_run).await,
        Commands::GeocodeProviders { dry_run } => cmd_geocode_providers(dry_run).await,
        Commands::IssueToken {
            sub,
            email,
            permissions,
            hours,
        } => cmd_issue_token(sub, email, permissions, hours),
    }
}

async fn get_pool(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

/// Look up a migration, printing a failure response when it is unknown
fn lookup(name: &str) -> Result<Option<MigrationEntry>> {
    let entry = find_migration(name);
    if entry.is_none() {
        output(&Response::failed(format!("Migration '{}' not found", name)))?;
    }
    Ok(entry)
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_list() -> Result<()> {
    let migrations = all_migrations()
        .into_iter()
        .map(|e| {
            let description = e.migration.description();
            MigrationInfo {
                name: e.migration.name().to_string(),
                description: (!description.is_empty()).then(|| description.to_string()),
            }
        })
        .collect();

    output(&Response {
        migrations: Some(migrations),
        ..Response::ok()
    })
}

async fn cmd_estimate(name: &str) -> Result<()> {
    let Some(entry) = lookup(name)? else {
        return Ok(());
    };
    let pool = get_pool(&Config::from_env()?).await?;

    let count = entry.migration.estimate(&pool).await?;

    output(&Response {
        count: Some(count),
        ..Response::ok()
    })
}

async fn cmd_run(name: &str, dry_run: bool) -> Result<()> {
    let Some(entry) = lookup(name)? else {
        return Ok(());
    };
    let pool = get_pool(&Config::from_env()?).await?;

    let total = entry.migration.estimate(&pool).await?;
    output(&Response {
        message: Some(format!(
            "Running {} over about {} items{}",
            name,
            total,
            if dry_run { " (dry run)" } else { "" }
        )),
        count: Some(total),
        ..Response::ok()
    })?;

    let ctx = MigrationContext {
        db_pool: pool,
        dry_run,
    };

    let summary = run_migration(entry.migration.as_ref(), &ctx, |progress| {
        let update = ProgressUpdate {
            update_type: "batch",
            progress: Some(progress),
            id: None,
            message: None,
        };
        if let Ok(line) = serde_json::to_string(&update) {
            println!("{}", line);
        }
    })
    .await?;

    let message = if summary.aborted {
        format!(
            "Stopped: error rate {:.2}% exceeded budget",
            summary.progress.error_rate() * 100.0
        )
    } else {
        "Migration run complete".to_string()
    };

    output(&Response {
        success: !summary.aborted,
        message: Some(message),
        progress: Some(summary.progress),
        ..Default::default()
    })
}

async fn cmd_verify(name: &str) -> Result<()> {
    let Some(entry) = lookup(name)? else {
        return Ok(());
    };
    let pool = get_pool(&Config::from_env()?).await?;

    let response = match entry.migration.verify(&pool).await? {
        VerifyResult::Passed => Response {
            message: Some("Verification passed".to_string()),
            ..Response::ok()
        },
        VerifyResult::Incomplete { remaining } => Response {
            message: Some(format!("{} items remaining", remaining)),
            count: Some(remaining),
            ..Response::failed("Incomplete")
        },
        VerifyResult::Failed { issues } => Response {
            issues: Some(issues),
            ..Response::failed("Verification failed")
        },
    };

    output(&response)
}

async fn cmd_geocode_resources(dry_run: bool) -> Result<()> {
    let pool = get_pool(&Config::from_env()?).await?;
    let client = reqwest::Client::new();

    let resources = Resource::find_missing_coordinates(&pool).await?;
    let mut progress = MigrationProgress::default();

    for (index, resource) in resources.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(GEOCODE_PACING).await;
        }

        let Some(address) = resource.address.as_deref() else {
            progress.skipped += 1;
            continue;
        };

        let (update_type, message) = match geocode_address(&client, address).await {
            Ok(Some(found)) => {
                if !dry_run {
                    Resource::update_coordinates(&resource.id, found.coordinate, &pool).await?;
                }
                progress.completed += 1;
                ("geocoded", Some(found.display_name))
            }
            Ok(None) => {
                progress.skipped += 1;
                ("not_found", None)
            }
            Err(e) => {
                progress.failed += 1;
                ("failed", Some(e.to_string()))
            }
        };

        output(&ProgressUpdate {
            update_type,
            progress: None,
            id: Some(&resource.id),
            message,
        })?;
    }

    output(&Response {
        message: Some(format!(
            "Processed {} resources{}",
            resources.len(),
            if dry_run { " (dry run)" } else { "" }
        )),
        progress: Some(progress),
        ..Response::ok()
    })
}

async fn cmd_geocode_providers(dry_run: bool) -> Result<()> {
    let pool = get_pool(&Config::from_env()?).await?;
    let client = reqwest::Client::new();

    let providers = Provider::find_missing_coordinates(&pool).await?;
    let mut progress = MigrationProgress::default();

    for (index, provider) in providers.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(GEOCODE_PACING).await;
        }

        let id = provider.id.to_string();
        let (update_type, message) =
            match geocode_address(&client, &provider.geocoding_query()).await {
                Ok(Some(found)) => {
                    if !dry_run {
                        Provider::update_coordinates(provider.id, found.coordinate, &pool).await?;
                    }
                    progress.completed += 1;
                    ("geocoded", Some(found.display_name))
                }
                Ok(None) => {
                    progress.skipped += 1;
                    ("not_found", None)
                }
                Err(e) => {
                    progress.failed += 1;
                    ("failed", Some(e.to_string()))
                }
            };

        output(&ProgressUpdate {
            update_type,
            progress: None,
            id: Some(&id),
            message,
        })?;
    }

    output(&Response {
        message: Some(format!(
            "Processed {} providers{}",
            providers.len(),
            if dry_run { " (dry run)" } else { "" }
        )),
        progress: Some(progress),
        ..Response::ok()
    })
}

fn cmd_issue_token(sub: i64, email: String, permissions: Vec<String>, hours: i64) -> Result<()> {
    let config = Config::from_env()?;
    let jwt = JwtService::new(&config.jwt_secret, config.jwt_issuer.clone());

    let token = jwt.create_token(sub, email, permissions, chrono::Duration::hours(hours))?;

    output(&Response {
        token: Some(token),
        ..Response::ok()
    })
}
