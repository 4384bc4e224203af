//! Opt-out cascade.
//!
//! Withdrawal of consent deactivates the node, ends its sessions, and
//! returns any job it holds to the claimable pool, all in a single
//! transaction, so a concurrent claimer never observes a half-released
//! state.

use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::ApiError;
use crate::domains::jobs::models::Job;
use crate::domains::nodes::models::{Node, Session};

/// Process a node's opt-out. Returns its public id.
pub async fn opt_out(api_token: Option<&str>, pool: &PgPool) -> Result<Uuid, ApiError> {
    let node = Node::authenticate(api_token, pool).await?;

    let mut tx = pool.begin().await.map_err(ApiError::Database)?;

    sqlx::query(
        r#"
        UPDATE nodes
        SET is_active = FALSE, opt_out_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(node.id)
    .execute(&mut *tx)
    .await?;

    let sessions_ended = Session::end_all_for_node(node.id, &mut *tx).await?;
    let jobs_released = Job::release_all_for_node(node.id, &mut *tx).await?;

    tx.commit().await.map_err(ApiError::Database)?;

    tracing::info!(
        node_public_id = %node.public_id,
        sessions_ended,
        jobs_released,
        "node opted out"
    );

    Ok(node.public_id)
}
