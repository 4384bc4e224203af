//! Test fixtures for creating nodes and jobs.

use anyhow::Result;
use axum::Router;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use compute_core::domains::jobs::models::{Job, JobStatus, JobSubmission};

use super::http;

/// Credentials returned by node registration.
pub struct TestNode {
    pub public_id: String,
    pub api_token: String,
    pub session_token: String,
}

/// Register a consenting node over the API.
pub async fn register_node(app: &Router) -> TestNode {
    let (status, body) = http::post(
        app,
        "/compute/register-node",
        None,
        json!({"consent_flag": true, "user_agent": "test-node/1.0"}),
    )
    .await;
    assert_eq!(status, 200, "registration failed: {body}");

    TestNode {
        public_id: body["node_public_id"].as_str().unwrap().to_string(),
        api_token: body["api_token"].as_str().unwrap().to_string(),
        session_token: body["session_token"].as_str().unwrap().to_string(),
    }
}

/// Insert a pending job directly, bypassing preflight.
pub async fn insert_pending_job(pool: &PgPool, job_type: &str, payload: Value) -> Result<Uuid> {
    let job = Job::from_submission(
        Uuid::new_v4(),
        JobSubmission {
            job_type: job_type.to_string(),
            payload,
            target_url: None,
            max_depth: None,
            max_pages: None,
        },
        JobStatus::Pending,
    );
    job.insert(pool).await?;
    Ok(job.id)
}

/// Current status label of a job.
pub async fn job_status(pool: &PgPool, job_id: Uuid) -> Result<String> {
    let status: String = sqlx::query_scalar("SELECT status::text FROM jobs WHERE id = $1")
        .bind(job_id)
        .fetch_one(pool)
        .await?;
    Ok(status)
}
