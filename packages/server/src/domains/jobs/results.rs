//! Result ingestion: ownership check, integrity verification, and the
//! completed transition, with the last two in one transaction.

use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::checksum::result_checksum;
use crate::common::error::ApiError;
use crate::domains::jobs::models::JobResult;
use crate::domains::nodes::models::Node;

pub struct ResultIngestor {
    pool: PgPool,
}

impl ResultIngestor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Accept a node's result for a job it currently holds.
    ///
    /// The job must be claimed by exactly this node; a node that was
    /// released by opt-out can no longer submit. The caller-supplied
    /// checksum must match the digest of the canonical payload byte for
    /// byte; on mismatch nothing is stored and the job stays claimed.
    pub async fn submit(
        &self,
        api_token: Option<&str>,
        job_id: Uuid,
        result_json: Value,
        claimed_checksum: &str,
    ) -> Result<(), ApiError> {
        let node = Node::authenticate(api_token, &self.pool).await?;

        // Ownership + state in one query: a row comes back only if this
        // node holds the claim right now.
        let owned: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT j.id
            FROM jobs j
            WHERE j.id = $1
              AND j.claimed_by_node_id = $2
              AND j.status = 'claimed'
            "#,
        )
        .bind(job_id)
        .bind(node.id)
        .fetch_optional(&self.pool)
        .await?;

        if owned.is_none() {
            return Err(ApiError::Forbidden(
                "job not owned by node or not in claimed state".to_string(),
            ));
        }

        let computed = result_checksum(&result_json)?;
        if computed != claimed_checksum {
            tracing::warn!(
                job_id = %job_id,
                node_public_id = %node.public_id,
                "result checksum mismatch"
            );
            return Err(ApiError::Integrity(
                "checksum mismatch - integrity validation failed".to_string(),
            ));
        }

        // Store the result and complete the job atomically; a failure of
        // either statement rolls back both.
        let record = JobResult::new(job_id, node.id, result_json, computed);

        let mut tx = self.pool.begin().await.map_err(ApiError::Database)?;
        record.insert(&mut *tx).await?;

        // The claimant is cleared with the transition (claimed_by_node_id
        // is set iff status = 'claimed'); attribution lives on in
        // job_results.node_id.
        let completed = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'completed', completed_at = NOW(), claimed_by_node_id = NULL
            WHERE id = $1 AND status = 'claimed'
            "#,
        )
        .bind(job_id)
        .execute(&mut *tx)
        .await?;

        if completed.rows_affected() != 1 {
            // Claim state changed between the ownership check and here
            tx.rollback().await.map_err(ApiError::Database)?;
            return Err(ApiError::Forbidden(
                "job not owned by node or not in claimed state".to_string(),
            ));
        }

        tx.commit().await.map_err(ApiError::Database)?;

        tracing::info!(
            job_id = %job_id,
            node_public_id = %node.public_id,
            "job result accepted"
        );

        Ok(())
    }
}
