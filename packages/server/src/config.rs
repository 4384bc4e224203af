use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

use crawl_guard::guardrails::{SYSTEM_MAX_DEPTH, SYSTEM_MAX_PAGES};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Comma-separated crawl allow-list; empty means deny everything
    pub allowed_domains: Vec<String>,
    /// User-agent presented to robots.txt rules
    pub crawler_user_agent: String,
    /// System-wide crawl ceilings; job budgets are capped at these
    pub max_crawl_depth: u32,
    pub max_crawl_pages: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            allowed_domains: env::var("ALLOWED_DOMAINS")
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .collect(),
            crawler_user_agent: env::var("CRAWLER_USER_AGENT")
                .unwrap_or_else(|_| "communitybot".to_string()),
            max_crawl_depth: env::var("MAX_CRAWL_DEPTH")
                .ok()
                .map(|v| v.parse())
                .transpose()
                .context("MAX_CRAWL_DEPTH must be a valid number")?
                .unwrap_or(SYSTEM_MAX_DEPTH),
            max_crawl_pages: env::var("MAX_CRAWL_PAGES")
                .ok()
                .map(|v| v.parse())
                .transpose()
                .context("MAX_CRAWL_PAGES must be a valid number")?
                .unwrap_or(SYSTEM_MAX_PAGES),
        })
    }
}
