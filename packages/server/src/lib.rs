// Community Compute Coordinator - API core
//
// Coordinates untrusted worker nodes pulling jobs from a shared queue:
// registration/consent, the atomic claim protocol, verified result
// ingestion, and opt-out cascade. Crawl policy and guardrails live in
// the crawl-guard package.

pub mod common;
pub mod config;
pub mod domains;
pub mod server;

pub use config::*;
