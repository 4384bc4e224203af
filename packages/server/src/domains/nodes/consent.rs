//! Consent ledger updates.

use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::ApiError;
use crate::domains::nodes::models::Node;

/// Strict format check for a consent document hash: fixed-length
/// hexadecimal, 32-128 characters.
pub fn is_valid_consent_hash(hash: &str) -> bool {
    (32..=128).contains(&hash.len()) && hash.chars().all(|c| c.is_ascii_hexdigit())
}

/// Record a node's agreement to a consent document version.
///
/// Last-write-wins: a newer version/hash overwrites the previous one.
/// Safe to replay with identical input.
pub async fn record_consent(
    api_token: Option<&str>,
    version: &str,
    hash: &str,
    pool: &PgPool,
) -> Result<Uuid, ApiError> {
    // Missing credential outranks field validation (401 before 400);
    // an unknown credential is only discovered at lookup (403).
    let token = api_token.ok_or(ApiError::TokenMissing)?;

    if version.is_empty() || hash.is_empty() {
        return Err(ApiError::Validation(
            "Missing required fields: consent_version, consent_hash".to_string(),
        ));
    }
    if !is_valid_consent_hash(hash) {
        tracing::warn!(consent_hash = %hash, "malformed consent hash rejected");
        return Err(ApiError::Validation(
            "Invalid consent_hash format".to_string(),
        ));
    }

    let node = Node::find_by_api_token(token, pool)
        .await?
        .ok_or(ApiError::TokenUnknown)?;

    sqlx::query(
        r#"
        UPDATE nodes
        SET consent_provided = TRUE,
            consent_version = $1,
            consent_hash = $2,
            consent_updated_at = NOW()
        WHERE id = $3
        "#,
    )
    .bind(version)
    .bind(hash)
    .bind(node.id)
    .execute(pool)
    .await?;

    tracing::info!(
        node_public_id = %node.public_id,
        consent_version = %version,
        "consent recorded"
    );

    Ok(node.public_id)
}
