// Crawl safety for community compute jobs: pre-dispatch policy checks
// (domain allow-list, robots.txt) and execution-time guardrails
// (depth/page ceilings, cycle detection).

pub mod executor;
pub mod guardrails;
pub mod policy;
pub mod reason;
pub mod robots;

// Re-exports for clean API
pub use executor::{CrawlExecutor, CrawlOutcome, Fetcher, FrontierPage};
pub use guardrails::{CrawlGuardrails, CrawlJobSpec, GuardrailViolation};
pub use policy::{AllowAllRobots, DomainPolicy, ParsedRobotsPolicy, RobotsPolicy, StaticDomainPolicy};
pub use reason::ReasonCode;
pub use robots::RobotsTxt;
