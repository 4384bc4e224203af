//! Node registration.
//!
//! A node joins the network by explicitly consenting; registration
//! issues its credentials (public id, API token, session token) in one
//! transaction.

use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::ApiError;
use crate::domains::nodes::models::{Node, Session};

/// Credentials issued to a freshly registered node
#[derive(Debug, Clone)]
pub struct Registration {
    pub node_public_id: Uuid,
    pub api_token: String,
    pub session_token: String,
}

/// Register a node and open its first session.
///
/// `consent_flag` must be explicitly `true`; anything else (absent,
/// false, non-boolean upstream) is a validation failure.
pub async fn register(
    user_agent: Option<String>,
    consent_flag: bool,
    user_ref: Option<String>,
    pool: &PgPool,
) -> Result<Registration, ApiError> {
    if !consent_flag {
        return Err(ApiError::Validation(
            "Consent required to join the network".to_string(),
        ));
    }

    let user_agent = user_agent
        .filter(|ua| !ua.trim().is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    let node = Node::new(user_ref);
    let session = Session::new(node.id, user_agent);

    let mut tx = pool.begin().await.map_err(ApiError::Database)?;
    node.insert(&mut *tx).await?;
    session.insert(&mut *tx).await?;
    tx.commit().await.map_err(ApiError::Database)?;

    tracing::info!(
        node_public_id = %node.public_id,
        "node registered"
    );

    Ok(Registration {
        node_public_id: node.public_id,
        api_token: node.api_token,
        session_token: session.token,
    })
}
