// Main entry point for the compute coordination API

use std::sync::Arc;

use anyhow::{Context, Result};
use compute_core::{server::build_app, Config};
use crawl_guard::guardrails::CrawlGuardrails;
use crawl_guard::policy::{ParsedRobotsPolicy, StaticDomainPolicy};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,compute_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Community Compute Coordinator");

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        allowed_domains = config.allowed_domains.len(),
        "Configuration loaded"
    );

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    // Policy providers: allow-list from config; robots rules default to
    // permissive until rules for a host are registered
    let domain_policy = Arc::new(StaticDomainPolicy::new(config.allowed_domains.clone()));
    let robots_policy = Arc::new(ParsedRobotsPolicy::new(config.crawler_user_agent.clone()));
    let guardrails = CrawlGuardrails::new(config.max_crawl_depth, config.max_crawl_pages);

    let app = build_app(pool, domain_policy, robots_policy, guardrails);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
