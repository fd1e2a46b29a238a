//! PostGIS-backed harness for store-level tests.
//!
//! One container is started for the whole test binary and migrations run
//! once into a template database. Each test then gets its own database
//! cloned from the template, so row counts never leak between tests.

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

const TEMPLATE_DATABASE: &str = "directory_template";

struct SharedTestInfra {
    server_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_name("postgis/postgis")
            .with_tag("16-3.4")
            .start()
            .await
            .context("Failed to start PostGIS container")?;

        let host = postgres.get_host().await?;
        let port = postgres.get_host_port_ipv4(5432).await?;
        let server_url = format!("postgresql://postgres:postgres@{}:{}", host, port);

        let admin = connect_with_retry(&format!("{}/postgres", server_url)).await?;
        sqlx::query(&format!("CREATE DATABASE {}", TEMPLATE_DATABASE))
            .execute(&admin)
            .await
            .context("Failed to create template database")?;
        admin.close().await;

        let template = connect_with_retry(&format!("{}/{}", server_url, TEMPLATE_DATABASE)).await?;
        sqlx::migrate!("./migrations")
            .run(&template)
            .await
            .context("Failed to run migrations")?;
        // CREATE DATABASE ... TEMPLATE needs the template to be idle
        template.close().await;

        Ok(Self {
            server_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// The PostGIS image restarts the server once after its init scripts, so
/// the first ready message can come from the short-lived setup instance.
async fn connect_with_retry(url: &str) -> Result<PgPool> {
    let mut attempts = 0;
    loop {
        let result = PgPoolOptions::new().max_connections(5).connect(url).await;
        match result {
            Ok(pool) => match sqlx::query("SELECT 1").execute(&pool).await {
                Ok(_) => return Ok(pool),
                Err(e) if attempts >= 30 => return Err(e.into()),
                Err(_) => pool.close().await,
            },
            Err(e) if attempts >= 30 => {
                return Err(e).with_context(|| format!("Failed to connect to {}", url))
            }
            Err(_) => {}
        }
        attempts += 1;
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}

/// A freshly migrated database for one test
///
/// ```ignore
/// #[test_context(DatabaseHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &DatabaseHarness) {
///     let store = PgResourceStore::new(ctx.db_pool.clone());
/// }
/// ```
pub struct DatabaseHarness {
    pub db_pool: PgPool,
}

impl AsyncTestContext for DatabaseHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create database harness")
    }

    async fn teardown(self) {
        self.db_pool.close().await;
    }
}

impl DatabaseHarness {
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;
        let name = format!("test_{}", Uuid::new_v4().simple());

        let admin = connect_with_retry(&format!("{}/postgres", infra.server_url)).await?;
        sqlx::query(&format!(
            "CREATE DATABASE {} TEMPLATE {}",
            name, TEMPLATE_DATABASE
        ))
        .execute(&admin)
        .await
        .context("Failed to clone template database")?;
        admin.close().await;

        let db_pool = PgPool::connect(&format!("{}/{}", infra.server_url, name))
            .await
            .context("Failed to connect to test database")?;

        Ok(Self { db_pool })
    }
}
