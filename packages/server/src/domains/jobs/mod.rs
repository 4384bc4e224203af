//! The job lifecycle: preflight admission, the atomic claim protocol,
//! guarded crawl execution, and verified result ingestion.

pub mod executor;
pub mod models;
pub mod preflight;
pub mod queue;
pub mod results;
pub mod scheduler;

pub use models::{Job, JobResult, JobStatus, JobSubmission, JobView};
pub use preflight::{PreflightValidator, PreflightVerdict};
pub use queue::JobQueue;
pub use results::ResultIngestor;
pub use scheduler::Scheduler;
