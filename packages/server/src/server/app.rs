//! Application setup and router construction.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, HeaderName, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crawl_guard::guardrails::CrawlGuardrails;
use crawl_guard::policy::{DomainPolicy, RobotsPolicy};

use crate::domains::jobs::{JobQueue, PreflightValidator, ResultIngestor, Scheduler};
use crate::server::extract::API_TOKEN_HEADER;
use crate::server::routes::{
    consent_handler, fetch_job_handler, health_handler, job_result_handler, opt_out_handler,
    register_node_handler, submit_job_handler,
};

/// Shared application state: the database handle plus the domain
/// services constructed around it. No process-wide mutable state.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub queue: Arc<JobQueue>,
    pub ingestor: Arc<ResultIngestor>,
    pub scheduler: Arc<Scheduler>,
}

/// Build the axum application router.
///
/// Policy providers are injected so deployments (and tests) decide what
/// is crawlable; everything else hangs off the pool.
pub fn build_app(
    pool: PgPool,
    domain_policy: Arc<dyn DomainPolicy>,
    robots_policy: Arc<dyn RobotsPolicy>,
    guardrails: CrawlGuardrails,
) -> Router {
    let preflight = PreflightValidator::new(domain_policy, robots_policy);

    let app_state = AppState {
        db_pool: pool.clone(),
        queue: Arc::new(JobQueue::new(pool.clone())),
        ingestor: Arc::new(ResultIngestor::new(pool.clone())),
        scheduler: Arc::new(Scheduler::new(pool, preflight, guardrails)),
    };

    // Browser clients send the node credential cross-origin
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(API_TOKEN_HEADER)]);

    Router::new()
        .route("/compute/register-node", post(register_node_handler))
        .route("/compute/consent", post(consent_handler))
        .route("/compute/job", get(fetch_job_handler))
        .route("/compute/job/result", post(job_result_handler))
        .route("/compute/job/submit", post(submit_job_handler))
        .route("/compute/opt-out", post(opt_out_handler))
        .route("/health", get(health_handler))
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
