//! Opt-out cascade: node deactivation, session closure, and claim release.

mod common;

use serde_json::json;
use test_context::test_context;

use common::{fixtures, http, TestHarness};

#[test_context(TestHarness)]
#[tokio::test]
async fn opt_out_without_token_is_401(ctx: &TestHarness) {
    let (status, _) = http::post(&ctx.app, "/compute/opt-out", None, json!({})).await;
    assert_eq!(status, 401);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn opt_out_with_unknown_token_is_403(ctx: &TestHarness) {
    let (status, _) = http::post(&ctx.app, "/compute/opt-out", Some("bogus"), json!({})).await;
    assert_eq!(status, 403);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn opt_out_deactivates_node_sessions_and_releases_job(ctx: &TestHarness) {
    let node = fixtures::register_node(&ctx.app).await;
    let job_id = fixtures::insert_pending_job(&ctx.db_pool, "hash_compute", json!({"n": 1}))
        .await
        .unwrap();
    let (status, _) = http::get(&ctx.app, "/compute/job", Some(&node.api_token)).await;
    assert_eq!(status, 200);

    let (status, body) = http::post(&ctx.app, "/compute/opt-out", Some(&node.api_token), json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"].as_str().unwrap(), "success");
    assert_eq!(body["node_public_id"].as_str().unwrap(), node.public_id);

    let (active, opted_out): (bool, bool) = sqlx::query_as(
        "SELECT is_active, opt_out_at IS NOT NULL FROM nodes WHERE api_token = $1",
    )
    .bind(&node.api_token)
    .fetch_one(&ctx.db_pool)
    .await
    .unwrap();
    assert!(!active);
    assert!(opted_out);

    let open_sessions: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sessions s
         JOIN nodes n ON n.id = s.node_id
         WHERE n.api_token = $1 AND s.is_active",
    )
    .bind(&node.api_token)
    .fetch_one(&ctx.db_pool)
    .await
    .unwrap();
    assert_eq!(open_sessions, 0);

    // The in-flight job goes back to the pool with no claimant.
    let label = fixtures::job_status(&ctx.db_pool, job_id).await.unwrap();
    assert_eq!(label, "pending");

    let claimant: Option<uuid::Uuid> =
        sqlx::query_scalar("SELECT claimed_by_node_id FROM jobs WHERE id = $1")
            .bind(job_id)
            .fetch_one(&ctx.db_pool)
            .await
            .unwrap();
    assert!(claimant.is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn released_job_is_claimable_by_another_node(ctx: &TestHarness) {
    let leaver = fixtures::register_node(&ctx.app).await;
    let job_id = fixtures::insert_pending_job(&ctx.db_pool, "hash_compute", json!({}))
        .await
        .unwrap();
    let (status, _) = http::get(&ctx.app, "/compute/job", Some(&leaver.api_token)).await;
    assert_eq!(status, 200);

    let (status, _) = http::post(&ctx.app, "/compute/opt-out", Some(&leaver.api_token), json!({})).await;
    assert_eq!(status, 200);

    let other = fixtures::register_node(&ctx.app).await;
    let (status, body) = http::get(&ctx.app, "/compute/job", Some(&other.api_token)).await;
    assert_eq!(status, 200);
    assert_eq!(body["job_id"].as_str().unwrap(), job_id.to_string());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn opted_out_node_cannot_claim(ctx: &TestHarness) {
    let node = fixtures::register_node(&ctx.app).await;
    let (status, _) = http::post(&ctx.app, "/compute/opt-out", Some(&node.api_token), json!({})).await;
    assert_eq!(status, 200);

    fixtures::insert_pending_job(&ctx.db_pool, "hash_compute", json!({}))
        .await
        .unwrap();

    let (status, _) = http::get(&ctx.app, "/compute/job", Some(&node.api_token)).await;
    assert_eq!(status, 403);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn opt_out_without_claims_still_succeeds(ctx: &TestHarness) {
    let node = fixtures::register_node(&ctx.app).await;

    let (status, body) = http::post(&ctx.app, "/compute/opt-out", Some(&node.api_token), json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"].as_str().unwrap(), "success");
}
