//! Node and session records.
//!
//! Nodes are never physically deleted; opt-out soft-deactivates them so
//! the audit trail (consent history, submitted results) stays intact.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::common::error::ApiError;

/// A registered worker node
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Node {
    pub id: Uuid,
    /// Opaque identifier safe to hand back to callers
    pub public_id: Uuid,
    pub api_token: String,
    pub user_ref: Option<String>,
    pub is_active: bool,
    pub consent_provided: bool,
    pub consent_version: Option<String>,
    pub consent_hash: Option<String>,
    pub consented_at: Option<DateTime<Utc>>,
    pub consent_updated_at: Option<DateTime<Utc>>,
    pub opt_out_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Node {
    /// Create a new active node that has just given registration consent
    pub fn new(user_ref: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            public_id: Uuid::new_v4(),
            api_token: Uuid::new_v4().simple().to_string(),
            user_ref,
            is_active: true,
            consent_provided: true,
            consent_version: None,
            consent_hash: None,
            consented_at: Some(now),
            consent_updated_at: None,
            opt_out_at: None,
            created_at: now,
        }
    }

    pub async fn insert<'e>(&self, executor: impl PgExecutor<'e>) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            INSERT INTO nodes (
                id, public_id, api_token, user_ref, is_active, consent_provided,
                consent_version, consent_hash, consented_at, consent_updated_at,
                opt_out_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(self.id)
        .bind(self.public_id)
        .bind(&self.api_token)
        .bind(&self.user_ref)
        .bind(self.is_active)
        .bind(self.consent_provided)
        .bind(&self.consent_version)
        .bind(&self.consent_hash)
        .bind(self.consented_at)
        .bind(self.consent_updated_at)
        .bind(self.opt_out_at)
        .bind(self.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn find_by_api_token(token: &str, pool: &PgPool) -> Result<Option<Self>, ApiError> {
        let node = sqlx::query_as::<_, Self>(
            r#"
            SELECT id, public_id, api_token, user_ref, is_active, consent_provided,
                   consent_version, consent_hash, consented_at, consent_updated_at,
                   opt_out_at, created_at
            FROM nodes
            WHERE api_token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await?;

        Ok(node)
    }

    /// Resolve the node for a request credential.
    ///
    /// Missing credential and unknown credential are distinct failures
    /// (401 vs 403).
    pub async fn authenticate(token: Option<&str>, pool: &PgPool) -> Result<Self, ApiError> {
        let token = token.ok_or(ApiError::TokenMissing)?;
        Self::find_by_api_token(token, pool)
            .await?
            .ok_or(ApiError::TokenUnknown)
    }
}

/// An authenticated session owned by a node
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub token: String,
    pub node_id: Uuid,
    pub user_agent: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(node_id: Uuid, user_agent: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            token: Uuid::new_v4().simple().to_string(),
            node_id,
            user_agent,
            is_active: true,
            created_at: Utc::now(),
            ended_at: None,
        }
    }

    pub async fn insert<'e>(&self, executor: impl PgExecutor<'e>) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, token, node_id, user_agent, is_active, created_at, ended_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(self.id)
        .bind(&self.token)
        .bind(self.node_id)
        .bind(&self.user_agent)
        .bind(self.is_active)
        .bind(self.created_at)
        .bind(self.ended_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Terminate every active session owned by a node. Returns the count.
    pub async fn end_all_for_node<'e>(
        node_id: Uuid,
        executor: impl PgExecutor<'e>,
    ) -> Result<u64, ApiError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET is_active = FALSE, ended_at = NOW()
            WHERE node_id = $1 AND is_active
            "#,
        )
        .bind(node_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}
