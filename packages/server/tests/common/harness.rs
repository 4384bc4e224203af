//! Test harness with testcontainers for integration testing.
//!
//! One Postgres container is shared across all tests; each test gets
//! its own freshly migrated database so concurrent tests never see
//! each other's queue state.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use sqlx::PgPool;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use compute_core::server::build_app;
use crawl_guard::guardrails::CrawlGuardrails;
use crawl_guard::policy::{ParsedRobotsPolicy, StaticDomainPolicy};
use crawl_guard::robots::RobotsTxt;

/// Domain present on the test allow-list.
pub const ALLOWED_DOMAIN: &str = "allowed.test";

/// Shared container, started once for the whole test run.
struct SharedTestInfra {
    base_url: String,
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // Respect RUST_LOG in test output; ignore double-init
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .with_cmd(["-c", "max_connections=200"])
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let host = postgres.get_host().await?;
        let port = postgres.get_host_port_ipv4(5432).await?;
        let base_url = format!("postgresql://postgres:postgres@{}:{}", host, port);

        Ok(Self {
            base_url,
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

/// Per-test context: an isolated database plus a router wired to it.
pub struct TestHarness {
    pub db_pool: PgPool,
    pub app: Router,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        // Pool drops with the harness; databases are cleaned up with
        // the shared container at the end of the run
    }
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;

        // Fresh database per test
        let db_name = format!("test_{}", Uuid::new_v4().simple());
        let admin = PgPool::connect(&format!("{}/postgres", infra.base_url))
            .await
            .context("Failed to connect to admin database")?;
        sqlx::query(&format!("CREATE DATABASE {}", db_name))
            .execute(&admin)
            .await
            .context("Failed to create test database")?;
        admin.close().await;

        let db_pool = PgPool::connect(&format!("{}/{}", infra.base_url, db_name))
            .await
            .context("Failed to connect to test database")?;
        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to run migrations")?;

        // Policies under test: one allow-listed domain whose robots.txt
        // blocks /private/
        let robots = RobotsTxt::parse("User-agent: *\nDisallow: /private/\n");
        let domain_policy = Arc::new(StaticDomainPolicy::new([ALLOWED_DOMAIN.to_string()]));
        let robots_policy =
            Arc::new(ParsedRobotsPolicy::new("communitybot").with_host_rules(ALLOWED_DOMAIN, robots));

        let app = build_app(
            db_pool.clone(),
            domain_policy,
            robots_policy,
            CrawlGuardrails::default(),
        );

        Ok(Self { db_pool, app })
    }
}
