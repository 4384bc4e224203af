//! Job admission: preflight validation composed with the queue.

use sqlx::PgPool;
use uuid::Uuid;

use crawl_guard::guardrails::CrawlGuardrails;

use crate::common::error::ApiError;
use crate::domains::jobs::models::{Job, JobStatus, JobSubmission};
use crate::domains::jobs::preflight::{PreflightValidator, PreflightVerdict};

pub struct Scheduler {
    pool: PgPool,
    preflight: PreflightValidator,
    guardrails: CrawlGuardrails,
}

impl Scheduler {
    pub fn new(pool: PgPool, preflight: PreflightValidator, guardrails: CrawlGuardrails) -> Self {
        Self {
            pool,
            preflight,
            guardrails,
        }
    }

    /// Validate and admit a submission.
    ///
    /// On pass the job lands `pending` and becomes claimable; on block
    /// it is stored `rejected` with the reason and is never visible to
    /// the claim query. A declared crawl budget is clamped to the
    /// system ceilings before storage, so no stored job carries a
    /// budget the guardrails would not honor.
    pub async fn schedule(&self, mut submission: JobSubmission) -> Result<Job, ApiError> {
        submission.max_depth = submission
            .max_depth
            .map(|d| d.min(self.guardrails.max_depth() as i32));
        submission.max_pages = submission
            .max_pages
            .map(|p| p.min(self.guardrails.max_pages() as i32));

        let job_id = Uuid::new_v4();
        let verdict = self
            .preflight
            .validate(job_id, submission.target_url.as_deref());

        let job = match verdict {
            PreflightVerdict::Allowed => {
                Job::from_submission(job_id, submission, JobStatus::Pending)
            }
            PreflightVerdict::Blocked { code, detail } => {
                let mut job = Job::from_submission(job_id, submission, JobStatus::Rejected);
                job.failure_code = Some(code.as_str().to_string());
                job.failure_detail = Some(detail);
                job
            }
        };

        job.insert(&self.pool).await?;

        match job.status {
            JobStatus::Pending => tracing::info!(
                job_id = %job.id,
                job_type = %job.job_type,
                "job admitted"
            ),
            _ => tracing::info!(
                job_id = %job.id,
                job_type = %job.job_type,
                failure_code = job.failure_code.as_deref().unwrap_or(""),
                "job rejected before dispatch"
            ),
        }

        Ok(job)
    }
}
