//! Execution-time bounds for a single in-flight crawl job.
//!
//! Guardrails are independent of the claim protocol: they bound what an
//! already-claimed crawl may do, and any violation is fatal to the job.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::reason::ReasonCode;

/// System-wide hard ceilings a job's own budget can never exceed.
pub const SYSTEM_MAX_DEPTH: u32 = 10;
pub const SYSTEM_MAX_PAGES: u32 = 1000;

/// The crawl-relevant slice of a claimed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlJobSpec {
    pub job_id: Uuid,
    pub start_url: String,
    pub max_depth: u32,
    pub max_pages: u32,
}

/// A guardrail violation. Carries the enumerated reason plus detail for
/// the audit log; the owning job transitions to `aborted`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{code}: {detail}")]
pub struct GuardrailViolation {
    pub code: ReasonCode,
    pub detail: String,
}

impl GuardrailViolation {
    fn new(code: ReasonCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }
}

/// Depth, page-count and cycle enforcement for one crawl execution.
#[derive(Debug, Clone)]
pub struct CrawlGuardrails {
    max_depth: u32,
    max_pages: u32,
}

impl Default for CrawlGuardrails {
    fn default() -> Self {
        Self {
            max_depth: SYSTEM_MAX_DEPTH,
            max_pages: SYSTEM_MAX_PAGES,
        }
    }
}

impl CrawlGuardrails {
    pub fn new(max_depth: u32, max_pages: u32) -> Self {
        Self {
            max_depth,
            max_pages,
        }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Validate a crawl payload before any fetching starts.
    pub fn validate_payload(&self, spec: &CrawlJobSpec) -> Result<(), GuardrailViolation> {
        if spec.start_url.trim().is_empty() {
            return Err(self.violation(spec, ReasonCode::InvalidPayload, "missing start_url"));
        }
        if spec.max_pages == 0 {
            return Err(self.violation(spec, ReasonCode::InvalidPayload, "max_pages must be > 0"));
        }
        Ok(())
    }

    /// Enforce depth and page ceilings during execution.
    ///
    /// The effective ceiling is the lower of the job's own budget and
    /// the system-wide limit.
    pub fn check_limits(
        &self,
        spec: &CrawlJobSpec,
        current_depth: u32,
        pages_crawled: u32,
    ) -> Result<(), GuardrailViolation> {
        if current_depth > spec.max_depth.min(self.max_depth) {
            return Err(self.violation(
                spec,
                ReasonCode::DepthLimit,
                format!("depth {} exceeds limit", current_depth),
            ));
        }
        if pages_crawled >= spec.max_pages.min(self.max_pages) {
            return Err(self.violation(
                spec,
                ReasonCode::PageLimit,
                format!("page budget exhausted at {}", pages_crawled),
            ));
        }
        Ok(())
    }

    /// Detect circular crawl patterns within one job's run.
    ///
    /// The visited set is owned by the single execution flow processing
    /// the job; nothing here is shared across jobs or nodes.
    pub fn detect_cycle(
        &self,
        spec: &CrawlJobSpec,
        visited: &HashSet<String>,
        next_url: &str,
    ) -> Result<(), GuardrailViolation> {
        if visited.contains(next_url) {
            return Err(self.violation(
                spec,
                ReasonCode::CycleDetected,
                format!("circular link pattern at {}", next_url),
            ));
        }
        Ok(())
    }

    fn violation(
        &self,
        spec: &CrawlJobSpec,
        code: ReasonCode,
        detail: impl Into<String>,
    ) -> GuardrailViolation {
        let violation = GuardrailViolation::new(code, detail);
        tracing::warn!(
            job_id = %spec.job_id,
            url = %spec.start_url,
            guardrail = %violation.code,
            reason = %violation.detail,
            action = "aborted",
            "crawl guardrail violation"
        );
        violation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(max_depth: u32, max_pages: u32) -> CrawlJobSpec {
        CrawlJobSpec {
            job_id: Uuid::new_v4(),
            start_url: "https://example.org/".to_string(),
            max_depth,
            max_pages,
        }
    }

    #[test]
    fn payload_requires_start_url() {
        let guards = CrawlGuardrails::default();
        let mut bad = spec(3, 10);
        bad.start_url = "   ".to_string();
        let err = guards.validate_payload(&bad).unwrap_err();
        assert_eq!(err.code, ReasonCode::InvalidPayload);
    }

    #[test]
    fn payload_requires_positive_page_budget() {
        let guards = CrawlGuardrails::default();
        let err = guards.validate_payload(&spec(3, 0)).unwrap_err();
        assert_eq!(err.code, ReasonCode::InvalidPayload);
    }

    #[test]
    fn depth_within_job_budget_passes() {
        let guards = CrawlGuardrails::default();
        let spec = spec(3, 100);
        assert!(guards.check_limits(&spec, 3, 5).is_ok());
    }

    #[test]
    fn depth_beyond_job_budget_violates() {
        let guards = CrawlGuardrails::default();
        let spec = spec(3, 100);
        let err = guards.check_limits(&spec, 4, 5).unwrap_err();
        assert_eq!(err.code, ReasonCode::DepthLimit);
    }

    #[test]
    fn system_ceiling_caps_generous_job_budget() {
        let guards = CrawlGuardrails::new(10, 1000);
        let spec = spec(50, 100);
        // Job asked for depth 50, system allows 10
        let err = guards.check_limits(&spec, 11, 5).unwrap_err();
        assert_eq!(err.code, ReasonCode::DepthLimit);
    }

    #[test]
    fn page_budget_exhaustion_violates() {
        let guards = CrawlGuardrails::default();
        let spec = spec(3, 10);
        assert!(guards.check_limits(&spec, 1, 9).is_ok());
        let err = guards.check_limits(&spec, 1, 10).unwrap_err();
        assert_eq!(err.code, ReasonCode::PageLimit);
    }

    #[test]
    fn revisited_url_is_a_cycle() {
        let guards = CrawlGuardrails::default();
        let spec = spec(3, 10);
        let mut visited = HashSet::new();
        visited.insert("https://example.org/a".to_string());

        assert!(guards
            .detect_cycle(&spec, &visited, "https://example.org/b")
            .is_ok());
        let err = guards
            .detect_cycle(&spec, &visited, "https://example.org/a")
            .unwrap_err();
        assert_eq!(err.code, ReasonCode::CycleDetected);
    }
}
