//! Policy providers consulted during preflight validation.
//!
//! Both providers are read-only: the scheduler asks "may this job touch
//! that URL" and never mutates policy state.

use std::collections::{HashMap, HashSet};

use url::Url;

use crate::robots::RobotsTxt;

/// Answers whether a domain is on the crawl allow-list.
///
/// Deny-by-default: a domain the provider does not know is blocked.
pub trait DomainPolicy: Send + Sync {
    fn is_allowed(&self, domain: &str) -> bool;
}

/// Answers whether a specific URL may be fetched under robots.txt rules.
pub trait RobotsPolicy: Send + Sync {
    fn is_allowed(&self, url: &Url) -> bool;
}

/// Allow-list backed by a fixed set of domains.
///
/// Matching is case-insensitive on the exact host; subdomains must be
/// listed explicitly.
#[derive(Debug, Clone, Default)]
pub struct StaticDomainPolicy {
    allowed: HashSet<String>,
}

impl StaticDomainPolicy {
    pub fn new(domains: impl IntoIterator<Item = String>) -> Self {
        Self {
            allowed: domains.into_iter().map(|d| d.to_lowercase()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

impl DomainPolicy for StaticDomainPolicy {
    fn is_allowed(&self, domain: &str) -> bool {
        self.allowed.contains(&domain.to_lowercase())
    }
}

/// Robots policy backed by pre-parsed robots.txt rules per host.
///
/// Hosts without a known robots.txt are treated as allowing everything,
/// per standard robots semantics.
pub struct ParsedRobotsPolicy {
    user_agent: String,
    per_host: HashMap<String, RobotsTxt>,
}

impl ParsedRobotsPolicy {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            per_host: HashMap::new(),
        }
    }

    /// Register parsed robots.txt rules for a host.
    pub fn with_host_rules(mut self, host: impl Into<String>, robots: RobotsTxt) -> Self {
        self.per_host.insert(host.into().to_lowercase(), robots);
        self
    }
}

impl RobotsPolicy for ParsedRobotsPolicy {
    fn is_allowed(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        match self.per_host.get(&host.to_lowercase()) {
            Some(robots) => robots.is_allowed(&self.user_agent, url.path()),
            None => true,
        }
    }
}

/// Robots policy that permits everything. Useful where robots data is
/// sourced elsewhere or in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllRobots;

impl RobotsPolicy for AllowAllRobots {
    fn is_allowed(&self, _url: &Url) -> bool {
        true
    }
}
