//! Preflight validation: the gate a job passes before it becomes
//! claimable.
//!
//! The domain allow-list (deny by default) is checked first, then the
//! robots policy for the full target URL; the first failure
//! short-circuits with its reason.

use std::sync::Arc;

use url::Url;
use uuid::Uuid;

use crawl_guard::policy::{DomainPolicy, RobotsPolicy};
use crawl_guard::reason::ReasonCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreflightVerdict {
    Allowed,
    Blocked { code: ReasonCode, detail: String },
}

impl PreflightVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PreflightVerdict::Allowed)
    }
}

pub struct PreflightValidator {
    domain_policy: Arc<dyn DomainPolicy>,
    robots_policy: Arc<dyn RobotsPolicy>,
}

impl PreflightValidator {
    pub fn new(
        domain_policy: Arc<dyn DomainPolicy>,
        robots_policy: Arc<dyn RobotsPolicy>,
    ) -> Self {
        Self {
            domain_policy,
            robots_policy,
        }
    }

    /// Validate a submission's target URL before admission.
    ///
    /// Submissions without a target URL have nothing to gate and pass.
    pub fn validate(&self, job_id: Uuid, target_url: Option<&str>) -> PreflightVerdict {
        let Some(target) = target_url else {
            return PreflightVerdict::Allowed;
        };

        let url = match Url::parse(target) {
            Ok(url) => url,
            Err(error) => {
                return self.block(
                    job_id,
                    target,
                    "url_parse",
                    ReasonCode::InvalidUrl,
                    format!("unparsable target URL: {error}"),
                );
            }
        };

        let Some(domain) = url.host_str() else {
            return self.block(
                job_id,
                target,
                "url_parse",
                ReasonCode::InvalidUrl,
                "target URL has no host".to_string(),
            );
        };

        if !self.domain_policy.is_allowed(domain) {
            return self.block(
                job_id,
                target,
                "domain_policy",
                ReasonCode::DomainNotAllowed,
                format!("domain not allow-listed: {domain}"),
            );
        }

        if !self.robots_policy.is_allowed(&url) {
            return self.block(
                job_id,
                target,
                "robots_policy",
                ReasonCode::RobotsDisallowed,
                format!("blocked by robots rules: {target}"),
            );
        }

        PreflightVerdict::Allowed
    }

    fn block(
        &self,
        job_id: Uuid,
        url: &str,
        policy: &str,
        code: ReasonCode,
        detail: String,
    ) -> PreflightVerdict {
        tracing::warn!(
            job_id = %job_id,
            url = %url,
            policy = %policy,
            reason = %detail,
            action = "blocked",
            "preflight validation blocked job"
        );
        PreflightVerdict::Blocked { code, detail }
    }
}
