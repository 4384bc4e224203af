use serde::{Deserialize, Serialize};

/// Enumerated reason for a job being blocked before dispatch or aborted
/// mid-crawl. Stored alongside a free-text detail string; the code is
/// the stable, queryable part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    // Preflight blocks
    DomainNotAllowed,
    RobotsDisallowed,
    InvalidUrl,

    // Execution-time guardrail violations
    InvalidPayload,
    DepthLimit,
    PageLimit,
    CycleDetected,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::DomainNotAllowed => "domain_not_allowed",
            ReasonCode::RobotsDisallowed => "robots_disallowed",
            ReasonCode::InvalidUrl => "invalid_url",
            ReasonCode::InvalidPayload => "invalid_payload",
            ReasonCode::DepthLimit => "depth_limit",
            ReasonCode::PageLimit => "page_limit",
            ReasonCode::CycleDetected => "cycle_detected",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
