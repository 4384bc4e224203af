//! Guarded crawl execution loop.
//!
//! Walks a crawl job's frontier breadth-first, consulting the guardrails
//! before every fetch. The first violation halts the crawl immediately;
//! callers transition the owning job to `aborted`.

use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;

use crate::guardrails::{CrawlGuardrails, CrawlJobSpec, GuardrailViolation};

/// Fetches one page and returns the URLs discovered on it.
///
/// Implementations own transport concerns entirely; the executor only
/// cares about the discovered links.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> anyhow::Result<Vec<String>>;
}

/// A frontier entry awaiting a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierPage {
    pub depth: u32,
    pub url: String,
}

/// What a completed (non-aborted) crawl produced.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub pages_crawled: u32,
    pub visited: HashSet<String>,
}

/// Runs one crawl job under guardrail enforcement.
pub struct CrawlExecutor<F> {
    guardrails: CrawlGuardrails,
    fetcher: F,
}

impl<F: Fetcher> CrawlExecutor<F> {
    pub fn new(guardrails: CrawlGuardrails, fetcher: F) -> Self {
        Self { guardrails, fetcher }
    }

    /// Execute the crawl described by `spec`.
    ///
    /// Returns the outcome on normal termination (frontier exhausted
    /// within budget) or the violation that aborted it. Fetch failures
    /// are not violations; the page is skipped and counted.
    pub async fn run(&self, spec: &CrawlJobSpec) -> Result<CrawlOutcome, GuardrailViolation> {
        self.guardrails.validate_payload(spec)?;

        let mut visited: HashSet<String> = HashSet::new();
        let mut pages_crawled: u32 = 0;
        let mut frontier = VecDeque::from([FrontierPage {
            depth: 0,
            url: spec.start_url.clone(),
        }]);

        while let Some(page) = frontier.pop_front() {
            self.guardrails
                .check_limits(spec, page.depth, pages_crawled)?;
            self.guardrails.detect_cycle(spec, &visited, &page.url)?;

            visited.insert(page.url.clone());
            pages_crawled += 1;

            let links = match self.fetcher.fetch(&page.url).await {
                Ok(links) => links,
                Err(error) => {
                    tracing::warn!(
                        job_id = %spec.job_id,
                        url = %page.url,
                        error = %error,
                        "fetch failed, skipping page"
                    );
                    continue;
                }
            };

            // Discovered links go on the frontier as-is; a revisit is a
            // circular pattern and aborts via detect_cycle above.
            for url in links {
                frontier.push_back(FrontierPage {
                    depth: page.depth + 1,
                    url,
                });
            }
        }

        tracing::info!(
            job_id = %spec.job_id,
            pages_crawled,
            "crawl completed within budget"
        );

        Ok(CrawlOutcome {
            pages_crawled,
            visited,
        })
    }
}
