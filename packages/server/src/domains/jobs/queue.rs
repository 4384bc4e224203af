//! The claim protocol.
//!
//! Many nodes poll concurrently; each pending job must be awarded to at
//! most one of them, and a node may hold at most one claimed job. The
//! contended path is a single `UPDATE ... FOR UPDATE SKIP LOCKED`
//! statement, so claimers skip locked rows instead of queuing behind
//! them.

use sqlx::PgPool;
use uuid::Uuid;

use crawl_guard::guardrails::GuardrailViolation;

use crate::common::error::ApiError;
use crate::domains::jobs::models::{Job, JobView};
use crate::domains::nodes::models::Node;

pub struct JobQueue {
    pool: PgPool,
}

impl JobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Claim the oldest pending job for the node behind `api_token`.
    ///
    /// Eligibility gates run first: the credential must resolve, the
    /// node must be active and consented, and it must not already hold
    /// a job. The claim itself is one atomic statement.
    pub async fn claim(&self, api_token: Option<&str>) -> Result<JobView, ApiError> {
        let node = Node::authenticate(api_token, &self.pool).await?;

        if !node.is_active {
            return Err(ApiError::Forbidden("node is inactive".to_string()));
        }
        if !node.consent_provided {
            return Err(ApiError::Forbidden("consent required".to_string()));
        }

        // Explicit one-job-per-node gate; the partial unique index on
        // jobs(claimed_by_node_id) is the backstop underneath it.
        if Job::node_has_active_claim(node.id, &self.pool).await? {
            return Err(ApiError::Conflict(
                "node already has an active job".to_string(),
            ));
        }

        let Some(job) = Job::claim_next(node.id, &self.pool).await? else {
            return Err(ApiError::NoJobAvailable);
        };

        tracing::info!(
            job_id = %job.id,
            node_public_id = %node.public_id,
            job_type = %job.job_type,
            "job claimed"
        );

        Ok(JobView::from(job))
    }

    /// Abort a claimed job after a guardrail violation.
    ///
    /// Fatal to the job: no retry, no re-queue. Returns false if the
    /// job was no longer in the claimed state (e.g. released by a
    /// concurrent opt-out).
    pub async fn abort(
        &self,
        job_id: Uuid,
        violation: &GuardrailViolation,
    ) -> Result<bool, ApiError> {
        let aborted = Job::abort(job_id, violation.code, &violation.detail, &self.pool).await?;

        if aborted {
            tracing::warn!(
                job_id = %job_id,
                failure_code = %violation.code,
                reason = %violation.detail,
                "job aborted"
            );
        }

        Ok(aborted)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
