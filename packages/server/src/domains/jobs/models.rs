//! Job and job-result records.
//!
//! The status machine: `pending -> claimed` (claim), `claimed ->
//! completed` (result ingestion), `claimed -> pending` (opt-out
//! release), `pending -> rejected` (failed preflight), `claimed ->
//! aborted` (guardrail violation). `completed`, `rejected` and
//! `aborted` are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crawl_guard::reason::ReasonCode;

use crate::common::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Claimed,
    Completed,
    Aborted,
    Rejected,
}

impl JobStatus {
    /// Whether any further transition is defined out of this state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Aborted | JobStatus::Rejected
        )
    }
}

/// A unit of work in the shared queue
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub job_type: String,
    /// Opaque to the queue; only the executing node interprets it
    pub payload: Value,
    pub status: JobStatus,
    pub claimed_by_node_id: Option<Uuid>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failure_code: Option<String>,
    pub failure_detail: Option<String>,
    pub target_url: Option<String>,
    pub max_depth: Option<i32>,
    pub max_pages: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// What a submitter provides; the scheduler decides admission.
#[derive(Debug, Clone, Deserialize)]
pub struct JobSubmission {
    pub job_type: String,
    pub payload: Value,
    pub target_url: Option<String>,
    pub max_depth: Option<i32>,
    pub max_pages: Option<i32>,
}

/// The slice of a job handed to a claiming node
#[derive(Debug, Clone, Serialize)]
pub struct JobView {
    pub job_id: Uuid,
    #[serde(rename = "type")]
    pub job_type: String,
    pub data: Value,
}

impl From<Job> for JobView {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id,
            job_type: job.job_type,
            data: job.payload,
        }
    }
}

impl Job {
    /// Build a job from a submission in the given admission state.
    pub fn from_submission(id: Uuid, submission: JobSubmission, status: JobStatus) -> Self {
        Self {
            id,
            job_type: submission.job_type,
            payload: submission.payload,
            status,
            claimed_by_node_id: None,
            claimed_at: None,
            completed_at: None,
            failure_code: None,
            failure_detail: None,
            target_url: submission.target_url,
            max_depth: submission.max_depth,
            max_pages: submission.max_pages,
            created_at: Utc::now(),
        }
    }

    pub async fn insert<'e>(&self, executor: impl PgExecutor<'e>) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, job_type, payload, status, claimed_by_node_id, claimed_at,
                completed_at, failure_code, failure_detail, target_url,
                max_depth, max_pages, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(self.id)
        .bind(&self.job_type)
        .bind(&self.payload)
        .bind(self.status)
        .bind(self.claimed_by_node_id)
        .bind(self.claimed_at)
        .bind(self.completed_at)
        .bind(&self.failure_code)
        .bind(&self.failure_detail)
        .bind(&self.target_url)
        .bind(self.max_depth)
        .bind(self.max_pages)
        .bind(self.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>, ApiError> {
        let job = sqlx::query_as::<_, Self>(
            r#"
            SELECT id, job_type, payload, status, claimed_by_node_id, claimed_at,
                   completed_at, failure_code, failure_detail, target_url,
                   max_depth, max_pages, created_at
            FROM jobs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(job)
    }

    /// Whether the node currently holds a claimed job.
    pub async fn node_has_active_claim(node_id: Uuid, pool: &PgPool) -> Result<bool, ApiError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM jobs
                WHERE claimed_by_node_id = $1 AND status = 'claimed'
            )
            "#,
        )
        .bind(node_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Atomically claim the oldest pending job for a node.
    ///
    /// Single indivisible read-modify-write: `FOR UPDATE SKIP LOCKED`
    /// skips rows another claimer holds, so contention degrades
    /// gracefully instead of serializing all claimers. `None` means the
    /// queue is empty right now.
    ///
    /// Two racing claims from the same node can both pass the
    /// application-level gate; the loser trips the one-claim-per-node
    /// unique index here and is reported as a conflict, not a server
    /// error.
    pub async fn claim_next(node_id: Uuid, pool: &PgPool) -> Result<Option<Self>, ApiError> {
        let result = sqlx::query_as::<_, Self>(
            r#"
            UPDATE jobs
            SET status = 'claimed',
                claimed_by_node_id = $1,
                claimed_at = NOW()
            WHERE id = (
                SELECT id FROM jobs
                WHERE status = 'pending'
                ORDER BY created_at
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, job_type, payload, status, claimed_by_node_id, claimed_at,
                      completed_at, failure_code, failure_detail, target_url,
                      max_depth, max_pages, created_at
            "#,
        )
        .bind(node_id)
        .fetch_optional(pool)
        .await;

        match result {
            Ok(job) => Ok(job),
            Err(sqlx::Error::Database(db))
                if db.constraint() == Some("idx_jobs_one_claim_per_node") =>
            {
                Err(ApiError::Conflict(
                    "node already has an active job".to_string(),
                ))
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Transition a claimed job to `aborted` with the violation recorded.
    ///
    /// The claimant is cleared with the transition, which also frees the
    /// node's claim slot.
    pub async fn abort(
        id: Uuid,
        code: ReasonCode,
        detail: &str,
        pool: &PgPool,
    ) -> Result<bool, ApiError> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'aborted',
                failure_code = $1,
                failure_detail = $2,
                claimed_by_node_id = NULL
            WHERE id = $3 AND status = 'claimed'
            "#,
        )
        .bind(code.as_str())
        .bind(detail)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Return every job the node holds to the claimable pool.
    ///
    /// Runs inside the opt-out transaction; must never be called on its
    /// own connection outside it.
    pub async fn release_all_for_node<'e>(
        node_id: Uuid,
        executor: impl PgExecutor<'e>,
    ) -> Result<u64, ApiError> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'pending', claimed_by_node_id = NULL, claimed_at = NULL
            WHERE claimed_by_node_id = $1 AND status = 'claimed'
            "#,
        )
        .bind(node_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}

/// The verified output of a completed job. Written exactly once.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobResult {
    pub id: Uuid,
    pub job_id: Uuid,
    pub node_id: Uuid,
    pub result_json: Value,
    pub result_checksum: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl JobResult {
    pub fn new(job_id: Uuid, node_id: Uuid, result_json: Value, result_checksum: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            node_id,
            result_json,
            result_checksum,
            status: "submitted".to_string(),
            created_at: Utc::now(),
        }
    }

    pub async fn insert<'e>(&self, executor: impl PgExecutor<'e>) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            INSERT INTO job_results (id, job_id, node_id, result_json, result_checksum, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(self.id)
        .bind(self.job_id)
        .bind(self.node_id)
        .bind(&self.result_json)
        .bind(&self.result_checksum)
        .bind(&self.status)
        .bind(self.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn find_by_job_id(job_id: Uuid, pool: &PgPool) -> Result<Option<Self>, ApiError> {
        let result = sqlx::query_as::<_, Self>(
            r#"
            SELECT id, job_id, node_id, result_json, result_checksum, status, created_at
            FROM job_results
            WHERE job_id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(pool)
        .await?;

        Ok(result)
    }
}
