//! Guarded execution of a claimed crawl job.
//!
//! Bridges the queue to crawl-guard: builds the crawl spec from the
//! job's stored budget, runs the guarded executor, and aborts the job
//! on the first violation. The crawl budget defaults to the system
//! ceilings when the job declares none; a declared budget is still
//! capped by the ceilings at check time.

use crawl_guard::executor::{CrawlExecutor, CrawlOutcome, Fetcher};
use crawl_guard::guardrails::{
    CrawlGuardrails, CrawlJobSpec, GuardrailViolation, SYSTEM_MAX_DEPTH, SYSTEM_MAX_PAGES,
};
use crawl_guard::reason::ReasonCode;

use crate::common::error::ApiError;
use crate::domains::jobs::models::Job;
use crate::domains::jobs::queue::JobQueue;

/// How a guarded crawl run ended.
#[derive(Debug)]
pub enum CrawlRun {
    Completed(CrawlOutcome),
    Aborted(GuardrailViolation),
}

/// Build the crawl spec for a claimed crawl job.
fn crawl_spec(job: &Job) -> Result<CrawlJobSpec, GuardrailViolation> {
    let start_url = job.target_url.clone().unwrap_or_default();
    if start_url.is_empty() {
        return Err(GuardrailViolation {
            code: ReasonCode::InvalidPayload,
            detail: "crawl job has no start URL".to_string(),
        });
    }
    if job.max_depth.is_some_and(|d| d < 0) || job.max_pages.is_some_and(|p| p <= 0) {
        return Err(GuardrailViolation {
            code: ReasonCode::InvalidPayload,
            detail: "crawl budget must satisfy max_depth >= 0, max_pages > 0".to_string(),
        });
    }

    Ok(CrawlJobSpec {
        job_id: job.id,
        start_url,
        max_depth: job.max_depth.map_or(SYSTEM_MAX_DEPTH, |d| d as u32),
        max_pages: job.max_pages.map_or(SYSTEM_MAX_PAGES, |p| p as u32),
    })
}

/// Run a claimed crawl job under guardrails, aborting it in the queue
/// on any violation.
pub async fn run_crawl_job<F: Fetcher>(
    queue: &JobQueue,
    guardrails: CrawlGuardrails,
    fetcher: F,
    job: &Job,
) -> Result<CrawlRun, ApiError> {
    let spec = match crawl_spec(job) {
        Ok(spec) => spec,
        Err(violation) => {
            queue.abort(job.id, &violation).await?;
            return Ok(CrawlRun::Aborted(violation));
        }
    };

    match CrawlExecutor::new(guardrails, fetcher).run(&spec).await {
        Ok(outcome) => Ok(CrawlRun::Completed(outcome)),
        Err(violation) => {
            queue.abort(job.id, &violation).await?;
            Ok(CrawlRun::Aborted(violation))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::jobs::models::{JobStatus, JobSubmission};
    use uuid::Uuid;

    fn crawl_job(target_url: Option<&str>, max_depth: Option<i32>, max_pages: Option<i32>) -> Job {
        Job::from_submission(
            Uuid::new_v4(),
            JobSubmission {
                job_type: "crawl".to_string(),
                payload: serde_json::json!({}),
                target_url: target_url.map(str::to_string),
                max_depth,
                max_pages,
            },
            JobStatus::Claimed,
        )
    }

    #[test]
    fn spec_defaults_to_system_ceilings() {
        let job = crawl_job(Some("https://example.org/"), None, None);
        let spec = crawl_spec(&job).unwrap();
        assert_eq!(spec.max_depth, SYSTEM_MAX_DEPTH);
        assert_eq!(spec.max_pages, SYSTEM_MAX_PAGES);
    }

    #[test]
    fn missing_start_url_is_invalid_payload() {
        let job = crawl_job(None, Some(3), Some(10));
        let violation = crawl_spec(&job).unwrap_err();
        assert_eq!(violation.code, ReasonCode::InvalidPayload);
    }

    #[test]
    fn non_positive_page_budget_is_invalid_payload() {
        let job = crawl_job(Some("https://example.org/"), Some(3), Some(0));
        let violation = crawl_spec(&job).unwrap_err();
        assert_eq!(violation.code, ReasonCode::InvalidPayload);
    }
}
