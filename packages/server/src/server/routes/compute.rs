//! The compute API: node registration, consent, job claim, result
//! submission, opt-out, and operator job submission.
//!
//! Bodies are taken as raw JSON values and picked apart by hand so that
//! every malformed-input path maps to the same 400 shape.

use axum::extract::Extension;
use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::common::error::ApiError;
use crate::domains::jobs::models::JobSubmission;
use crate::domains::nodes::{consent, opt_out, registration};
use crate::server::app::AppState;
use crate::server::extract::ApiToken;

fn field_str<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str)
}

/// POST /compute/register-node
pub async fn register_node_handler(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    // Consent must be the literal boolean true
    let consent_flag = body.get("consent_flag") == Some(&Value::Bool(true));

    let user_agent = field_str(&body, "user_agent")
        .map(str::to_string)
        .or_else(|| {
            headers
                .get(USER_AGENT)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        });

    // Accept either a string or numeric external reference
    let user_ref = body.get("user_id").and_then(|value| match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    let registration =
        registration::register(user_agent, consent_flag, user_ref, &state.db_pool).await?;

    Ok(Json(json!({
        "node_public_id": registration.node_public_id,
        "api_token": registration.api_token,
        "session_token": registration.session_token,
        "server_time": Utc::now().to_rfc3339(),
    })))
}

/// POST /compute/consent
pub async fn consent_handler(
    Extension(state): Extension<AppState>,
    token: ApiToken,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let version = field_str(&body, "consent_version").unwrap_or_default();
    let hash = field_str(&body, "consent_hash").unwrap_or_default();

    let node_public_id =
        consent::record_consent(token.as_deref(), version, hash, &state.db_pool).await?;

    Ok(Json(json!({
        "status": "success",
        "node_public_id": node_public_id,
    })))
}

/// GET /compute/job
pub async fn fetch_job_handler(
    Extension(state): Extension<AppState>,
    token: ApiToken,
) -> Result<Json<Value>, ApiError> {
    let view = state.queue.claim(token.as_deref()).await?;
    Ok(Json(serde_json::to_value(view).map_err(anyhow::Error::from)?))
}

/// POST /compute/job/result
pub async fn job_result_handler(
    Extension(state): Extension<AppState>,
    token: ApiToken,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    if token.0.is_none() {
        return Err(ApiError::TokenMissing);
    }

    let job_id = field_str(&body, "job_id")
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or_else(|| missing_result_fields())?;
    let result_json = body
        .get("result_json")
        .filter(|value| !value.is_null())
        .cloned()
        .ok_or_else(missing_result_fields)?;
    let checksum = field_str(&body, "result_checksum").ok_or_else(missing_result_fields)?;

    state
        .ingestor
        .submit(token.as_deref(), job_id, result_json, checksum)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Job result submitted",
    })))
}

fn missing_result_fields() -> ApiError {
    ApiError::Validation("job_id, result_json, result_checksum required".to_string())
}

/// POST /compute/opt-out
pub async fn opt_out_handler(
    Extension(state): Extension<AppState>,
    token: ApiToken,
) -> Result<Json<Value>, ApiError> {
    let node_public_id = opt_out::opt_out(token.as_deref(), &state.db_pool).await?;

    Ok(Json(json!({
        "status": "success",
        "node_public_id": node_public_id,
    })))
}

/// POST /compute/job/submit
///
/// Operator-facing admission: runs preflight and stores the job either
/// `pending` or `rejected` with its reason.
pub async fn submit_job_handler(
    Extension(state): Extension<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let submission: JobSubmission = serde_json::from_value(body)
        .map_err(|e| ApiError::Validation(format!("invalid job submission: {e}")))?;

    if submission.job_type.trim().is_empty() {
        return Err(ApiError::Validation("job_type is required".to_string()));
    }

    let job = state.scheduler.schedule(submission).await?;

    Ok(Json(json!({
        "job_id": job.id,
        "status": job.status,
        "failure_code": job.failure_code,
    })))
}
